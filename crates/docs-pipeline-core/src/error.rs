//! Error taxonomy shared by every [`Pipeline`](crate::pipeline::Pipeline)
//! implementation.

use thiserror::Error;

use crate::job::JobStatus;

/// Errors surfaced by pipeline operations.
///
/// Execution failures of individual jobs are *not* returned from
/// `enqueue_job`; they are recorded on the job and only surface here as
/// [`PipelineError::JobFailed`] when a caller waits for completion.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A job request was rejected before a job was created.
    #[error("invalid job request: {0}")]
    Validation(String),

    /// No job with the given id exists.
    #[error("job not found: {0}")]
    NotFound(String),

    /// The awaited job ended in `FAILED`; carries the captured message verbatim.
    #[error("{0}")]
    JobFailed(String),

    /// A completion wait for this job is already in flight on this client.
    #[error("already waiting for completion of job {0}")]
    AlreadyWaiting(String),

    /// The remote pipeline could not be reached.
    #[error("Failed to connect to remote pipeline at {endpoint}: {message}")]
    Connectivity { endpoint: String, message: String },

    /// The remote pipeline answered with a non-success status.
    #[error("remote pipeline returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// A status change that the job state machine does not allow.
    #[error("invalid status transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// The pipeline has been stopped and no longer admits work.
    #[error("pipeline is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }
}
