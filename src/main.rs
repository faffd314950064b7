//! StudyVault Page Server
//!
//! Renders pages of stored PDFs to watermarked PNGs so that the original
//! document never leaves the server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyvault_server::config::{BlobBackend, Config};
use studyvault_server::routes;
use studyvault_server::state::AppState;
use studyvault_server::storage::{BlobStore, HttpBlobStore, MemoryBlobStore, S3BlobStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "studyvault_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting StudyVault page server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Render scale {}, cache TTL {}s (sweep every {}s, max {} documents)",
        config.render.scale,
        config.cache.ttl_secs,
        config.cache.sweep_interval_secs,
        config.cache.max_entries
    );

    let store = blob_store(&config).await?;
    let state = AppState::new(config.clone(), store);
    state.start_background_tasks();

    let app = routes::app(state.clone());

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid SERVER_HOST {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    tracing::info!("StudyVault page server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn blob_store(config: &Config) -> anyhow::Result<Arc<dyn BlobStore>> {
    let storage = &config.storage;
    let store: Arc<dyn BlobStore> = match storage.backend {
        BlobBackend::Http => {
            tracing::info!("Blob backend: HTTP (uploads to {:?})", storage.upload_url);
            Arc::new(HttpBlobStore::new(
                storage.upload_url.clone(),
                storage.token.clone(),
                storage.fetch_timeout(),
            )?)
        }
        BlobBackend::S3 => {
            let s3 = storage
                .s3
                .as_ref()
                .context("BLOB_BACKEND=s3 requires S3_ENDPOINT, S3_BUCKET, S3_ACCESS_KEY and S3_SECRET_KEY")?;
            tracing::info!("Blob backend: S3 bucket {} at {}", s3.bucket, s3.endpoint);
            Arc::new(S3BlobStore::new(s3).await?)
        }
        BlobBackend::Memory => {
            tracing::warn!("Blob backend: in-memory, documents are lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
    };
    Ok(store)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
