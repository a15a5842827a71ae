//! In-memory job registry.
//!
//! Progress is keyed by job id so concurrent renders never share state.
//! A std `RwLock` guards the map because the FFmpeg progress callback runs
//! outside an async context; every critical section is a few field writes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

use scrollcast_models::{JobState, JobStatus};

struct JobEntry {
    state: JobState,
    cancel_tx: watch::Sender<bool>,
}

/// Registry of all jobs this process has accepted.
///
/// Entries are kept for the process lifetime: terminal jobs stay queryable
/// until restart, and each one holds a few hundred bytes. There is no
/// eviction.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued job; returns the cancellation receiver to hand
    /// to the render task.
    pub fn create(&self, job_id: &str) -> watch::Receiver<bool> {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let entry = JobEntry {
            state: JobState::new(job_id),
            cancel_tx,
        };
        self.write().insert(job_id.to_string(), entry);
        cancel_rx
    }

    /// Snapshot of a job's state.
    pub fn get(&self, job_id: &str) -> Option<JobState> {
        self.read().get(job_id).map(|e| e.state.clone())
    }

    pub fn start(&self, job_id: &str) {
        self.update(job_id, |s| s.start());
    }

    pub fn set_progress(&self, job_id: &str, percent: u8) {
        self.update(job_id, |s| s.set_progress(percent));
    }

    pub fn complete(&self, job_id: &str, output_file: &str) {
        self.update(job_id, |s| s.complete(output_file));
    }

    pub fn fail(&self, job_id: &str, error: &str) {
        self.update(job_id, |s| s.fail(error));
    }

    pub fn mark_cancelled(&self, job_id: &str) {
        self.update(job_id, |s| s.cancel());
    }

    /// Request cancellation of a running job. Returns `false` for unknown
    /// or already-terminal jobs.
    pub fn request_cancel(&self, job_id: &str) -> bool {
        let jobs = self.read();
        match jobs.get(job_id) {
            Some(entry) if !entry.state.is_terminal() => {
                let _ = entry.cancel_tx.send(true);
                true
            }
            _ => false,
        }
    }

    fn update(&self, job_id: &str, f: impl FnOnce(&mut JobState)) {
        if let Some(entry) = self.write().get_mut(job_id) {
            f(&mut entry.state);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let registry = JobRegistry::new();
        let _rx = registry.create("job-1");

        let state = registry.get("job-1").unwrap();
        assert_eq!(state.status, JobStatus::Queued);
        assert!(registry.get("job-2").is_none());
    }

    #[test]
    fn test_progress_updates() {
        let registry = JobRegistry::new();
        let _rx = registry.create("job-1");

        registry.start("job-1");
        registry.set_progress("job-1", 30);
        registry.set_progress("job-1", 10);

        let state = registry.get("job-1").unwrap();
        assert_eq!(state.status, JobStatus::Processing);
        assert_eq!(state.percent, 30);
    }

    #[test]
    fn test_cancel_flow() {
        let registry = JobRegistry::new();
        let rx = registry.create("job-1");
        registry.start("job-1");

        assert!(!*rx.borrow());
        assert!(registry.request_cancel("job-1"));
        assert!(*rx.borrow());

        registry.mark_cancelled("job-1");
        // Terminal jobs cannot be cancelled again
        assert!(!registry.request_cancel("job-1"));
        assert!(!registry.request_cancel("unknown"));
    }

    #[test]
    fn test_complete_and_fail_are_independent_jobs() {
        let registry = JobRegistry::new();
        let _rx1 = registry.create("job-1");
        let _rx2 = registry.create("job-2");

        registry.start("job-1");
        registry.set_progress("job-1", 60);
        registry.complete("job-1", "final_00ff00ff.mp4");

        registry.start("job-2");
        registry.set_progress("job-2", 40);
        registry.fail("job-2", "encoder failed");

        let done = registry.get("job-1").unwrap();
        assert_eq!(done.percent, 100);
        assert_eq!(done.output_file.as_deref(), Some("final_00ff00ff.mp4"));

        let failed = registry.get("job-2").unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.percent, 40);
    }
}
