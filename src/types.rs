use crate::error::{FilterError, Result};
use crate::rotator::Rotator;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsertRequest {
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RotateResponse {
    pub generation: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

pub struct AppState {
    pub rotator: Rotator,
}

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct ServerConfig {
    #[builder(default = "\"127.0.0.1\".to_string()")]
    pub server_host: String,
    #[builder(default = "3000")]
    pub server_port: u16,
    #[builder(default = "10000")]
    pub bloom_capacity: usize,
    #[builder(default = "0.01")]
    pub bloom_false_positive_rate: f64,
    #[builder(default = "true")]
    pub rotation_enabled: bool,
    #[builder(default = "Duration::from_secs(60)")]
    pub rotation_period: Duration,
    /// Selects the Redis backend when the `redis` feature is on
    #[builder(default = "None")]
    pub redis_uri: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env_or("SERVER_PORT", 3000)?,
            bloom_capacity: env_or("BLOOM_CAPACITY", 10000)?,
            bloom_false_positive_rate: env_or("BLOOM_FALSE_POSITIVE_RATE", 0.01)?,
            rotation_enabled: env_or("ROTATION_ENABLED", true)?,
            rotation_period: Duration::from_secs(env_or(
                "ROTATION_PERIOD_SECS",
                60,
            )?),
            redis_uri: std::env::var("REDIS_URI").ok(),
        })
    }
}

fn env_or<T>(var_name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var_name) {
        Ok(value) => value.parse().map_err(|e: T::Err| FilterError::EnvParseError {
            var_name: var_name.to_string(),
            value,
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
