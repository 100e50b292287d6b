//! Job record and status state machine.
//!
//! A [`Job`] is one unit of scrape/index work for a `(library, version)`
//! pair. Its status moves through the machine below; every mutation goes
//! through the `mark_*` methods so the timestamp and error invariants hold
//! no matter which component drives the change.
//!
//! ```text
//!             ┌──────────► CANCELLED ◄──────────┐
//!             │                                 │
//!   QUEUED ───┴──► RUNNING ──► CANCELLING ──────┘
//!                     │
//!                     ├──► COMPLETED
//!                     └──► FAILED
//! ```
//!
//! * `started_at` is set exactly once, on QUEUED → RUNNING.
//! * `finished_at` is set exactly once, on entering a terminal state.
//! * `error` is present if and only if the status is FAILED.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

/// Opaque scraper configuration, passed through to the executor unmodified.
pub type ScrapeOptions = serde_json::Value;

/// Lifecycle status of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    /// Cancellation was requested while running; the executor is unwinding.
    Cancelling,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelling,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelling => "cancelling",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// COMPLETED, FAILED and CANCELLED are terminal; nothing leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether the state machine permits `self -> next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelling)
                | (Cancelling, Cancelled)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PipelineError::validation(format!(
                    "unknown job status '{}'; expected one of queued, running, completed, failed, cancelling, cancelled",
                    s
                ))
            })
    }
}

/// Scrape progress as last reported by the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_scraped: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_discovered: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

/// Failure captured from the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
}

/// One unit of schedulable scrape/index work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub library: String,
    /// Empty string means "unversioned".
    #[serde(default)]
    pub version: String,
    pub options: ScrapeOptions,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<JobProgress>,
    #[serde(default)]
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Durable copy of the options the job was created with.
    #[serde(default)]
    pub scraper_options: Option<ScrapeOptions>,
}

impl Job {
    /// Build a fresh QUEUED job with a new UUID.
    pub fn new(library: impl Into<String>, version: impl Into<String>, options: ScrapeOptions) -> Self {
        let source_url = options
            .get("url")
            .and_then(|u| u.as_str())
            .map(|u| u.to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            library: library.into(),
            version: version.into(),
            scraper_options: Some(options.clone()),
            options,
            status: JobStatus::Queued,
            progress: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            source_url,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `library@version`, or just `library` when unversioned.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.library.clone()
        } else {
            format!("{}@{}", self.library, self.version)
        }
    }

    /// QUEUED → RUNNING.
    pub fn mark_running(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.apply(JobStatus::Running, at)?;
        if self.started_at.is_none() {
            self.started_at = Some(at);
        }
        Ok(())
    }

    /// RUNNING → COMPLETED.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.apply(JobStatus::Completed, at)
    }

    /// RUNNING → FAILED, capturing `message`.
    pub fn mark_failed(
        &mut self,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        self.apply(JobStatus::Failed, at)?;
        self.error = Some(JobError {
            message: message.into(),
        });
        Ok(())
    }

    /// RUNNING → CANCELLING.
    pub fn mark_cancelling(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.apply(JobStatus::Cancelling, at)
    }

    /// QUEUED → CANCELLED or CANCELLING → CANCELLED.
    pub fn mark_cancelled(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.apply(JobStatus::Cancelled, at)
    }

    /// RUNNING → QUEUED, for a record a dead process left RUNNING.
    ///
    /// Only startup recovery calls this. The job keeps its id and
    /// `created_at`; the abandoned attempt's `started_at` and progress are
    /// dropped so the record reads as never started until it is admitted
    /// again.
    pub fn requeue_interrupted(&mut self) -> Result<(), PipelineError> {
        if self.status != JobStatus::Running {
            return Err(PipelineError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: JobStatus::Queued,
            });
        }
        self.status = JobStatus::Queued;
        self.started_at = None;
        self.progress = None;
        Ok(())
    }

    fn apply(&mut self, next: JobStatus, at: DateTime<Utc>) -> Result<(), PipelineError> {
        if !self.status.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> Job {
        Job::new("react", "18.0.0", json!({ "url": "https://react.dev/reference" }))
    }

    #[test]
    fn new_job_is_queued_without_timestamps() {
        let j = job();
        assert_eq!(j.status, JobStatus::Queued);
        assert!(j.started_at.is_none());
        assert!(j.finished_at.is_none());
        assert!(j.error.is_none());
        assert_eq!(j.source_url.as_deref(), Some("https://react.dev/reference"));
        assert_eq!(j.scraper_options, Some(j.options.clone()));
    }

    #[test]
    fn completed_path_sets_each_timestamp_once() {
        let mut j = job();
        let t1 = Utc::now();
        j.mark_running(t1).unwrap();
        assert_eq!(j.started_at, Some(t1));
        assert!(j.finished_at.is_none());

        let t2 = t1 + chrono::Duration::seconds(5);
        j.mark_completed(t2).unwrap();
        assert_eq!(j.started_at, Some(t1));
        assert_eq!(j.finished_at, Some(t2));
        assert!(j.error.is_none());
    }

    #[test]
    fn failure_captures_message() {
        let mut j = job();
        j.mark_running(Utc::now()).unwrap();
        j.mark_failed("boom", Utc::now()).unwrap();
        assert_eq!(j.status, JobStatus::Failed);
        assert_eq!(j.error.as_ref().unwrap().message, "boom");
        assert!(j.finished_at.is_some());
    }

    #[test]
    fn queued_job_cancels_without_running() {
        let mut j = job();
        j.mark_cancelled(Utc::now()).unwrap();
        assert_eq!(j.status, JobStatus::Cancelled);
        assert!(j.started_at.is_none());
        assert!(j.finished_at.is_some());
    }

    #[test]
    fn running_job_cancels_through_cancelling() {
        let mut j = job();
        j.mark_running(Utc::now()).unwrap();
        j.mark_cancelling(Utc::now()).unwrap();
        assert!(j.finished_at.is_none());
        j.mark_cancelled(Utc::now()).unwrap();
        assert_eq!(j.status, JobStatus::Cancelled);
        assert!(j.finished_at.is_some());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut j = job();
        j.mark_running(Utc::now()).unwrap();
        j.mark_completed(Utc::now()).unwrap();
        let finished = j.finished_at;

        assert!(j.mark_running(Utc::now()).is_err());
        assert!(j.mark_failed("late", Utc::now()).is_err());
        assert!(j.mark_cancelling(Utc::now()).is_err());
        assert!(j.mark_cancelled(Utc::now()).is_err());
        assert_eq!(j.status, JobStatus::Completed);
        assert_eq!(j.finished_at, finished);
        assert!(j.error.is_none());
    }

    #[test]
    fn queued_cannot_complete_directly() {
        let mut j = job();
        let err = j.mark_completed(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: JobStatus::Queued,
                to: JobStatus::Completed,
                ..
            }
        ));
        assert_eq!(j.status, JobStatus::Queued);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("RUNNING".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert_eq!(" cancelled ".parse::<JobStatus>().unwrap(), JobStatus::Cancelled);
        assert!("paused".parse::<JobStatus>().is_err());
    }

    #[test]
    fn wire_form_is_camel_case() {
        let mut j = job();
        j.mark_running(Utc::now()).unwrap();
        let v = serde_json::to_value(&j).unwrap();
        assert_eq!(v["status"], "running");
        assert!(v.get("createdAt").is_some());
        assert!(v.get("startedAt").is_some());
        assert!(v["finishedAt"].is_null());
        assert_eq!(v["sourceUrl"], "https://react.dev/reference");

        let back: Job = serde_json::from_value(v).unwrap();
        assert_eq!(back, j);
    }

    #[test]
    fn interrupted_job_requeues_under_same_id() {
        let mut j = job();
        let created = j.created_at;
        j.mark_running(Utc::now()).unwrap();
        j.progress = Some(JobProgress {
            pages_scraped: Some(2),
            ..Default::default()
        });
        j.requeue_interrupted().unwrap();
        assert_eq!(j.status, JobStatus::Queued);
        assert_eq!(j.created_at, created);
        assert!(j.started_at.is_none());
        assert!(j.progress.is_none());

        j.mark_running(Utc::now()).unwrap();
        assert!(j.started_at.is_some());
    }

    #[test]
    fn only_running_jobs_requeue() {
        let mut j = job();
        assert!(j.requeue_interrupted().is_err());
        j.mark_cancelled(Utc::now()).unwrap();
        assert!(j.requeue_interrupted().is_err());
        assert_eq!(j.status, JobStatus::Cancelled);
    }

    #[test]
    fn label_omits_empty_version() {
        let j = Job::new("tokio", "", json!({}));
        assert_eq!(j.label(), "tokio");
        assert_eq!(job().label(), "react@18.0.0");
    }
}
