//! In-memory [`JobStore`] implementation for testing and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. Nothing
//! survives the process, so recovery against this store only sees jobs
//! written by the same process (or seeded through [`InMemoryJobStore::insert`]).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::job::{Job, JobStatus, ScrapeOptions};

use super::JobStore;

/// In-memory job store.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
    fail_writes: AtomicBool,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Seed a job directly, bypassing the write-failure switch.
    pub fn insert(&self, job: Job) {
        self.jobs.write().unwrap().insert(job.id.clone(), job);
    }

    /// Snapshot of a stored job.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent `upsert_job` fail, to exercise persistence
    /// failure handling.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn upsert_job(&self, job: &Job) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("in-memory store is rejecting writes");
        }
        self.jobs
            .write()
            .unwrap()
            .insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn list_jobs_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().unwrap();
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|j| statuses.contains(&j.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn get_scraper_options(&self, job_id: &str) -> Result<Option<ScrapeOptions>> {
        let jobs = self.jobs.read().unwrap();
        Ok(jobs
            .get(job_id)
            .and_then(|j| j.scraper_options.clone().or_else(|| Some(j.options.clone()))))
    }

    async fn delete_jobs(&self, ids: &[String]) -> Result<usize> {
        let mut jobs = self.jobs.write().unwrap();
        Ok(ids.iter().filter(|id| jobs.remove(*id).is_some()).count())
    }
}
