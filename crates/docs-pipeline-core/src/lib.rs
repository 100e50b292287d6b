//! # docs-pipeline core
//!
//! Transport-agnostic pieces of the documentation job pipeline: the [`job`]
//! record and its status state machine, the [`pipeline::Pipeline`] operation
//! contract shared by the embedded scheduler and the remote client, the
//! lifecycle callback hooks, and the [`store::JobStore`] persistence
//! abstraction.
//!
//! This crate contains no tokio, sqlx, reqwest, or other native-only
//! dependencies. Runtime implementations live in the `docs-pipeline` crate.

pub mod error;
pub mod job;
pub mod pipeline;
pub mod store;

pub use error::PipelineError;
pub use job::{Job, JobError, JobProgress, JobStatus, ScrapeOptions};
pub use pipeline::{CallbackSet, DocumentContext, JobCallbacks, NoopCallbacks, Pipeline};
pub use store::JobStore;
