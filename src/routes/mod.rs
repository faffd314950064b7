//! HTTP routes

pub mod documents;
pub mod health;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Document routes, nested under `/api/v1/documents`
pub fn documents_router() -> Router<AppState> {
    Router::new()
        .route("/", post(documents::upload_document))
        .route("/:handle/pages/:page", get(pages::render_page))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// The full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .nest("/api/v1/documents", documents_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
