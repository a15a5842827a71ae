//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers::{cancel_job, download, generate, health, progress};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/generate", post(generate))
        .route("/progress/:job_id", get(progress))
        .route("/jobs/:job_id/cancel", post(cancel_job))
        .route("/download/:filename", get(download))
        .route("/health", get(health))
        // Axum's built-in 2MB cap would reject media uploads
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST];

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(methods)
        .allow_headers(Any)
}
