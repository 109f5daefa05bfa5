//! Namespaced Cache - HTTP front for one namespace of a shared store
//!
//! Loads configuration, connects the store binding and serves the cache
//! operations until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use namespaced_cache::api::create_router;
use namespaced_cache::{
    spawn_purge_task, AppState, Config, MemoryStore, NamespacedCache, RedisStore, SharedStore,
    StoreBackend,
};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Load an optional `.env` file and initialize tracing
/// 2. Load configuration from environment variables
/// 3. Connect the store binding (and start the purge task for the memory store)
/// 4. Create the namespaced cache and the Axum router
/// 5. Serve until SIGINT/SIGTERM, then release the store connections
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namespaced_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting namespaced cache");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: env={}, namespace={}, backend={:?}, port={}, concurrency={}",
        config.environment, config.namespace, config.backend, config.server_port, config.concurrency
    );
    for mapping in &config.port_mappings {
        info!(name = %mapping.name, port = mapping.port, "Port mapping");
    }

    let (store, purge_handle) = connect_store(&config).await?;

    // Release connections even when the server fails
    let served = serve(&config, store.clone()).await;

    if let Some(handle) = purge_handle {
        handle.abort();
        warn!("Purge task aborted");
    }
    if let Err(err) = store.shutdown().await {
        warn!(error = %err, "Store shutdown reported an error");
    }

    served?;
    info!("Server shutdown complete");
    Ok(())
}

/// Builds the configured store binding.
async fn connect_store(config: &Config) -> anyhow::Result<(SharedStore, Option<JoinHandle<()>>)> {
    match config.backend {
        StoreBackend::Memory => {
            let memory = Arc::new(MemoryStore::new());
            let handle = spawn_purge_task(memory.clone(), config.purge_interval);
            info!("In-memory store initialized");
            let store: SharedStore = memory;
            Ok((store, Some(handle)))
        }
        StoreBackend::Redis => {
            let redis = RedisStore::connect(config.redis.clone())
                .await
                .with_context(|| format!("Failed to connect to {:?}", config.redis.nodes))?;
            let store: SharedStore = Arc::new(redis);
            Ok((store, None))
        }
    }
}

async fn serve(config: &Config, store: SharedStore) -> anyhow::Result<()> {
    let cache = NamespacedCache::new(config.namespace.clone(), store)?
        .with_concurrency(config.concurrency)
        .with_delete_key_mode(config.delete_key_mode);
    let app = create_router(AppState::new(cache));

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
