//! API configuration.

use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory uploads are saved to
    pub upload_dir: PathBuf,
    /// Directory finished artifacts are written to
    pub output_dir: PathBuf,
    /// Max request body size (multipart uploads)
    pub max_body_size: usize,
    /// Hard cap on one encoder run, in seconds
    pub render_timeout_secs: u64,
    /// Concurrent renders admitted; 1 serializes them
    pub render_concurrency: usize,
    /// Explicit caption font path
    pub font_path: Option<PathBuf>,
    /// CORS origins
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upload_dir: PathBuf::from("/tmp/scrollcast/uploads"),
            output_dir: PathBuf::from("/tmp/scrollcast/output"),
            max_body_size: 200 * 1024 * 1024, // 200MB of media uploads
            render_timeout_secs: 1800,
            render_concurrency: 1,
            font_path: None,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            render_timeout_secs: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.render_timeout_secs),
            render_concurrency: std::env::var("RENDER_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.render_concurrency),
            font_path: std::env::var("SCROLLCAST_FONT").ok().map(PathBuf::from),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
        }
    }
}
