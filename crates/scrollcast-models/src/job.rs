//! Per-job render state for progress polling.
//!
//! Progress is keyed by job id rather than held in a process-wide counter,
//! so concurrent renders cannot interfere with each other's reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Render job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a render slot
    #[default]
    Queued,
    /// Encoder is running
    Processing,
    /// Finished; output file available
    Completed,
    /// Render failed; progress is left where it stopped
    Failed,
    /// Cancelled by the client
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states receive no further updates.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one render job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier
    pub job_id: String,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100), monotonic within a run
    pub percent: u8,
    /// Output filename once completed
    pub output_file: Option<String>,
    /// Error message if the job failed
    pub error_message: Option<String>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the state was last updated
    pub updated_at: DateTime<Utc>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Queued,
            percent: 0,
            output_file: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the job as actively processing.
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
    }

    /// Update progress. Clamped to 100 and never allowed to decrease, so a
    /// reader polling mid-encode sees a monotonic sequence.
    pub fn set_progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.percent {
            self.percent = percent;
            self.updated_at = Utc::now();
        }
    }

    /// Mark completed with the output filename; forces 100%.
    pub fn complete(&mut self, output_file: impl Into<String>) {
        self.status = JobStatus::Completed;
        self.percent = 100;
        self.output_file = Some(output_file.into());
        self.updated_at = Utc::now();
    }

    /// Mark failed. Progress stays where the encoder stopped; a failed
    /// render must not report 100%.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Mark cancelled.
    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job() {
        let job = JobState::new("job-1");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.percent, 0);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_progress_monotonic() {
        let mut job = JobState::new("job-1");
        job.start();
        job.set_progress(40);
        job.set_progress(20);
        assert_eq!(job.percent, 40);
        job.set_progress(90);
        assert_eq!(job.percent, 90);
        job.set_progress(250u8.min(100));
        assert_eq!(job.percent, 100);
    }

    #[test]
    fn test_complete_forces_100() {
        let mut job = JobState::new("job-1");
        job.start();
        job.set_progress(97);
        job.complete("final_abcd1234.mp4");
        assert_eq!(job.percent, 100);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.is_terminal());
        assert_eq!(job.output_file.as_deref(), Some("final_abcd1234.mp4"));
    }

    #[test]
    fn test_fail_keeps_progress() {
        let mut job = JobState::new("job-1");
        job.start();
        job.set_progress(55);
        job.fail("encoder exploded");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.percent, 55);
        assert!(job.error_message.is_some());
    }

    #[test]
    fn test_cancel() {
        let mut job = JobState::new("job-1");
        job.start();
        job.cancel();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(job.is_terminal());
    }
}
