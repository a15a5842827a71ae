//! HTTP front end for the scroll-text video renderer.
//!
//! Accepts multipart render requests, queues them behind an admission
//! semaphore, and exposes per-job progress, cancellation, and artifact
//! download endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use jobs::JobRegistry;
pub use routes::create_router;
pub use state::AppState;
