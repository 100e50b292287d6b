//! The pipeline operation contract and lifecycle callback hooks.
//!
//! [`Pipeline`] is implemented twice: by the in-process scheduler, which owns
//! the worker pool and job table, and by the remote client, which forwards
//! every call over HTTP to a scheduler hosted elsewhere. Callers obtain an
//! `Arc<dyn Pipeline>` from the factory and never care which one they hold.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::job::{Job, JobProgress, JobStatus, ScrapeOptions};

/// The page or document an executor was working on when a non-fatal error
/// occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContext {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Hooks through which collaborators (CLI progress, logging, web UI)
/// observe job activity.
///
/// All methods default to no-ops. They are invoked synchronously while the
/// transition they describe is applied, so calls for a single job arrive in
/// transition order. Returning an error (or panicking) never affects the
/// job: the scheduler logs it and moves on.
pub trait JobCallbacks: Send + Sync {
    /// Called after every status transition.
    fn on_job_status_change(&self, _job: &Job) -> Result<()> {
        Ok(())
    }

    /// Called when the executor reports progress.
    fn on_job_progress(&self, _job: &Job, _progress: &JobProgress) -> Result<()> {
        Ok(())
    }

    /// Called when a job fails, or when the executor reports a per-document
    /// error that does not fail the job.
    fn on_job_error(&self, _job: &Job, _error: &str, _document: Option<&DocumentContext>) -> Result<()> {
        Ok(())
    }
}

/// Callbacks that ignore everything.
pub struct NoopCallbacks;

impl JobCallbacks for NoopCallbacks {}

/// Fans every callback out to several collaborators, in registration order.
///
/// Every collaborator is invoked even if an earlier one fails; the errors
/// are joined into one.
#[derive(Default)]
pub struct CallbackSet {
    callbacks: Vec<Arc<dyn JobCallbacks>>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, callbacks: Arc<dyn JobCallbacks>) -> Self {
        self.callbacks.push(callbacks);
        self
    }

    pub fn push(&mut self, callbacks: Arc<dyn JobCallbacks>) {
        self.callbacks.push(callbacks);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn each(&self, f: impl Fn(&dyn JobCallbacks) -> Result<()>) -> Result<()> {
        let errors: Vec<String> = self
            .callbacks
            .iter()
            .filter_map(|cb| f(cb.as_ref()).err())
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(errors.join("; ")))
        }
    }
}

impl JobCallbacks for CallbackSet {
    fn on_job_status_change(&self, job: &Job) -> Result<()> {
        self.each(|cb| cb.on_job_status_change(job))
    }

    fn on_job_progress(&self, job: &Job, progress: &JobProgress) -> Result<()> {
        self.each(|cb| cb.on_job_progress(job, progress))
    }

    fn on_job_error(&self, job: &Job, error: &str, document: Option<&DocumentContext>) -> Result<()> {
        self.each(|cb| cb.on_job_error(job, error, document))
    }
}

/// Operation surface shared by the embedded scheduler and the remote client.
///
/// | Method | Embedded scheduler | Remote client |
/// |--------|--------------------|---------------|
/// | [`start`](Pipeline::start) | spawn dispatcher, optional recovery | health check |
/// | [`stop`](Pipeline::stop) | cancel in-flight jobs, drain workers | abort poll loops |
/// | [`wait_for_job_completion`](Pipeline::wait_for_job_completion) | completion signal | timed polling |
/// | [`set_callbacks`](Pipeline::set_callbacks) | registers hooks | no-op |
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Begin accepting and running jobs.
    async fn start(&self) -> Result<(), PipelineError>;

    /// Stop admitting jobs and release in-flight work.
    async fn stop(&self) -> Result<(), PipelineError>;

    /// Create a QUEUED job and return its id. Never waits for a worker slot.
    async fn enqueue_job(
        &self,
        library: &str,
        version: &str,
        options: ScrapeOptions,
    ) -> Result<String, PipelineError>;

    /// Look up a job; `Ok(None)` when the id is unknown.
    async fn get_job(&self, id: &str) -> Result<Option<Job>, PipelineError>;

    /// List jobs, optionally restricted to one status.
    async fn get_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>, PipelineError>;

    /// Request cancellation. A no-op for terminal or unknown jobs.
    async fn cancel_job(&self, id: &str) -> Result<(), PipelineError>;

    /// Drop every COMPLETED, FAILED and CANCELLED job; returns how many.
    async fn clear_completed_jobs(&self) -> Result<usize, PipelineError>;

    /// Resolve once the job is terminal. FAILED jobs surface as
    /// [`PipelineError::JobFailed`]; COMPLETED and CANCELLED return `Ok`.
    async fn wait_for_job_completion(&self, id: &str) -> Result<(), PipelineError>;

    /// Register lifecycle hooks, replacing any earlier registration.
    fn set_callbacks(&self, callbacks: Arc<dyn JobCallbacks>);
}
