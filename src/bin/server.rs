use rotating_bloom_rs::api::create_router;
use rotating_bloom_rs::{
    AppState, BloomConfigBuilder, BloomFilter, CancellationToken, FilterFactory,
    InMemoryFilterFactory, Rotator, RotatorConfigBuilder, ServerConfig,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type DynFactory =
    Box<dyn Fn() -> rotating_bloom_rs::Result<BloomFilter> + Send + Sync>;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // load configuration from environment variables
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    let bloom_config = BloomConfigBuilder::default()
        .capacity(config.bloom_capacity)
        .false_positive_rate(config.bloom_false_positive_rate)
        .build()
        .expect("Failed to build bloom config");
    let rotator_config = RotatorConfigBuilder::default()
        .enabled(config.rotation_enabled)
        .period(config.rotation_period)
        .build()
        .expect("Failed to build rotator config");

    let factory = build_factory(&config, &bloom_config, &rotator_config);
    let shutdown = CancellationToken::new();
    let rotator = Rotator::new(rotator_config, factory, &shutdown)
        .expect("Failed to create rotator");

    let state = Arc::new(AppState { rotator });
    let app = create_router(state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    let backend = if config.redis_uri.is_some() && cfg!(feature = "redis") {
        "redis"
    } else {
        "inmemory"
    };
    info!(
        capacity = config.bloom_capacity,
        false_positive_rate = config.bloom_false_positive_rate,
        rotation_enabled = config.rotation_enabled,
        rotation_period = ?config.rotation_period,
        backend,
        "Rotating bloom filter configured"
    );
    info!("Starting server on http://{}", addr);
    info!("Swagger UI: http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .expect("Server error");
}

#[cfg(feature = "redis")]
fn build_factory(
    config: &ServerConfig,
    bloom_config: &rotating_bloom_rs::BloomConfig,
    rotator_config: &rotating_bloom_rs::RotatorConfig,
) -> DynFactory {
    use rotating_bloom_rs::{BloomParams, RedisFilterFactory};

    match &config.redis_uri {
        Some(uri) => {
            let client =
                redis::Client::open(uri.as_str()).expect("Invalid REDIS_URI");
            let mut factory = RedisFilterFactory::new(
                client,
                "rbf",
                BloomParams::from(bloom_config),
            );
            if let Some(ttl) = rotator_config.generation_ttl() {
                factory = factory.with_ttl(ttl);
            }
            Box::new(move || factory.create())
        }
        None => {
            let factory = InMemoryFilterFactory::new(bloom_config)
                .expect("Invalid bloom config");
            Box::new(move || factory.create())
        }
    }
}

#[cfg(not(feature = "redis"))]
fn build_factory(
    _config: &ServerConfig,
    bloom_config: &rotating_bloom_rs::BloomConfig,
    _rotator_config: &rotating_bloom_rs::RotatorConfig,
) -> DynFactory {
    let factory =
        InMemoryFilterFactory::new(bloom_config).expect("Invalid bloom config");
    Box::new(move || factory.create())
}
