use rust_scoring_api::config::Config;
use rust_scoring_api::dispatcher::Dispatcher;
use rust_scoring_api::handlers::{self, AppState};
use rust_scoring_api::store::{MemoryStore, Store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Picks the key-value store backend for this process.
#[cfg(feature = "redis-store")]
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.store_url {
        Some(ref url) => {
            let store = rust_scoring_api::store::RedisStore::connect(url)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::default())),
    }
}

#[cfg(not(feature = "redis-store"))]
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    if config.store_url.is_some() {
        anyhow::bail!("STORE_URL is set but this build lacks the `redis-store` feature");
    }
    Ok(Arc::new(MemoryStore::default()))
}

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Key-value store selection.
/// - HTTP routes and middleware (tracing, body size limit).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_scoring_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let store = build_store(&config).await?;
    tracing::info!("Key-value store initialized");

    let dispatcher = Dispatcher::new(config.auth.clone(), store, config.score_cache_ttl);

    // Build application state
    let app_state = Arc::new(AppState { dispatcher });

    let app = handlers::app(app_state, config.max_body_bytes);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
