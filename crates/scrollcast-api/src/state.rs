//! Application state.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::ApiConfig;
use crate::jobs::JobRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub jobs: Arc<JobRegistry>,
    /// Render admission: permits bound how many encodes run at once
    pub render_slots: Arc<Semaphore>,
}

impl AppState {
    /// Create new application state, ensuring the work directories exist.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        tokio::fs::create_dir_all(&config.output_dir).await?;

        let render_slots = Arc::new(Semaphore::new(config.render_concurrency));

        Ok(Self {
            config: Arc::new(config),
            jobs: Arc::new(JobRegistry::new()),
            render_slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = ApiConfig {
            upload_dir: dir.path().join("up"),
            output_dir: dir.path().join("out"),
            ..ApiConfig::default()
        };

        let state = AppState::new(config).await.unwrap();
        assert!(state.config.upload_dir.exists());
        assert!(state.config.output_dir.exists());
        assert_eq!(state.render_slots.available_permits(), 1);
    }
}
