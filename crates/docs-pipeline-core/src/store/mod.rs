//! Persistence abstraction for the job pipeline.
//!
//! The [`JobStore`] is the durable record of every job: the scheduler writes
//! each status transition through to it before the in-memory table changes,
//! and on startup reads it back to recover work left behind by a crashed
//! process.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::job::{Job, JobStatus, ScrapeOptions};

/// Durable storage for jobs.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_job`](JobStore::upsert_job) | Insert or overwrite status, progress, timestamps, error |
/// | [`list_jobs_by_status`](JobStore::list_jobs_by_status) | Recovery and inspection queries |
/// | [`get_scraper_options`](JobStore::get_scraper_options) | Original options for reproducible re-runs |
/// | [`delete_jobs`](JobStore::delete_jobs) | Housekeeping after `clear_completed_jobs` |
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert the job, or overwrite the stored copy with the same id.
    async fn upsert_job(&self, job: &Job) -> Result<()>;

    /// All stored jobs whose status is one of `statuses`, oldest first.
    async fn list_jobs_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>>;

    /// The options the job was originally created with.
    async fn get_scraper_options(&self, job_id: &str) -> Result<Option<ScrapeOptions>>;

    /// Delete the given jobs; returns how many rows existed.
    async fn delete_jobs(&self, ids: &[String]) -> Result<usize>;
}
