//! Background task execution
//!
//! A [`TaskWorker`] polls the queue, claims one entry at a time, runs its
//! task through a [`TaskExecutor`](agenthub_agent::TaskExecutor) and then
//! completes, requeues with backoff, or fails it.

use thiserror::Error;

pub mod backoff;
pub mod failure;
pub mod worker;

pub use backoff::{compute_backoff, next_run_at};
pub use failure::{classify, classify_error, FailureCode, FailureInfo};
pub use worker::{worker_id, TaskWorker, WORKER_ID_ENV};

/// Worker errors
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] agenthub_store::StoreError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
