//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::document::{BlobDocumentLoader, CacheConfig, CacheService, DocumentIngest, PdfEngine};
use crate::mupdf::MupdfEngine;
use crate::pipeline::PageService;
use crate::render::{PageRasterizer, WatermarkCompositor};
use crate::storage::BlobStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pages: PageService,
    ingest: DocumentIngest,
}

impl AppState {
    /// Wire the page pipeline on top of `store` with the MuPDF engine
    pub fn new(config: Config, store: Arc<dyn BlobStore>) -> Self {
        Self::with_engine(config, store, Arc::new(MupdfEngine::new()))
    }

    pub fn with_engine(config: Config, store: Arc<dyn BlobStore>, engine: Arc<dyn PdfEngine>) -> Self {
        let parse_timeout = Duration::from_secs(config.render.parse_timeout_secs);

        let loader = BlobDocumentLoader::new(
            store.clone(),
            engine.clone(),
            config.storage.fetch_timeout(),
            parse_timeout,
        );
        let cache = CacheService::new(
            Arc::new(loader),
            CacheConfig {
                ttl: config.cache.ttl(),
                sweep_interval: config.cache.sweep_interval(),
                max_entries: config.cache.max_entries,
            },
        );

        let compositor = Arc::new(WatermarkCompositor::from_config(&config.watermark));
        let pages = PageService::new(
            cache,
            PageRasterizer::new(config.render.scale),
            compositor,
            config.watermark.clone(),
            Duration::from_secs(config.render.render_timeout_secs),
        );
        let ingest = DocumentIngest::new(store, engine, parse_timeout);

        Self {
            inner: Arc::new(AppStateInner { config, pages, ingest }),
        }
    }

    /// Start the cache's idle sweep; needs a running tokio runtime
    pub fn start_background_tasks(&self) {
        self.cache().start_sweeper();
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn pages(&self) -> &PageService {
        &self.inner.pages
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        self.inner.pages.cache()
    }

    pub fn ingest(&self) -> &DocumentIngest {
        &self.inner.ingest
    }

    /// Stop background work before the process exits
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.cache().shutdown().await;
    }
}
