use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::FilterError;
use crate::rotator::Rotator;
use crate::types::{
    AppState, ErrorResponse, InsertRequest, QueryResponse, RotateResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(health_check, insert_item, query_item, rotate_filters),
    components(
        schemas(InsertRequest, QueryResponse, RotateResponse, ErrorResponse)
    ),
    tags(
        (name = "bloom-filter", description = "Rotating Bloom Filter API")
    )
)]
struct ApiDoc;

/// Any rotator failure surfaces as a 500 with the error text.
pub struct ApiError(FilterError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        let body = Json(ErrorResponse {
            message: self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Runs `op` on the blocking pool: backend calls may wait on the network.
async fn on_rotator<T, F>(state: Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Rotator) -> crate::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&state.rotator))
        .await
        .map_err(|e| ApiError(FilterError::StorageError(e.to_string())))?
        .map_err(ApiError)
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "bloom-filter",
    responses((status = 200, description = "API is healthy"))
)]
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Record a value in both generations
#[utoipa::path(
    post,
    path = "/items",
    tag = "bloom-filter",
    request_body = InsertRequest,
    responses(
        (status = 200, description = "Value recorded"),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
async fn insert_item(
    State(state): State<Arc<AppState>>,
    Json(InsertRequest { value }): Json<InsertRequest>,
) -> Result<StatusCode, ApiError> {
    debug!(%value, "add");
    on_rotator(state, move |rotator| rotator.add(&value)).await?;
    Ok(StatusCode::OK)
}

/// Whether a value was seen within the current window
#[utoipa::path(
    get,
    path = "/items/{value}",
    tag = "bloom-filter",
    params(("value" = String, Path, description = "Value to look up")),
    responses(
        (status = 200, description = "Lookup result", body = QueryResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
async fn query_item(
    State(state): State<Arc<AppState>>,
    Path(value): Path<String>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(%value, "exist");
    let exists = on_rotator(state, move |rotator| rotator.exist(&value)).await?;
    Ok(Json(QueryResponse { exists }))
}

/// Retire the current generation now
#[utoipa::path(
    post,
    path = "/rotate",
    tag = "bloom-filter",
    responses(
        (status = 200, description = "New generation", body = RotateResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
async fn rotate_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RotateResponse>, ApiError> {
    let generation = on_rotator(state, Rotator::rotate).await?;
    Ok(Json(RotateResponse { generation }))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .route("/health", get(health_check))
        .route("/items", post(insert_item))
        .route("/items/{value}", get(query_item))
        .route("/rotate", post(rotate_filters))
        .with_state(state)
}
