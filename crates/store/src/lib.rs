//! Task, queue and event persistence
//!
//! The worker, runtime and submitter all talk to storage through the
//! traits below. `MemoryStore` backs tests and single-process runs;
//! `SqliteStore` is the shared store several worker processes coordinate
//! through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod lifecycle;
pub mod memory;
pub mod model;
pub mod sqlite;

pub use lifecycle::{cancel_task, enqueue, review_task, submit_task, LifecycleError};
pub use memory::MemoryStore;
pub use model::{
    Event, EventType, Lock, NewTask, QueueEntry, QueueStatus, QueueUpdate, Task, TaskStatus,
    TaskUpdate, DEFAULT_MAX_ATTEMPTS,
};
pub use sqlite::SqliteStore;

/// Errors in store access
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn task_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "task",
            id: id.to_string(),
        }
    }

    pub(crate) fn entry_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "queue entry",
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<()>;
    async fn get_task(&self, id: &str) -> Result<Option<Task>>;
    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<()>;
    /// Apply `update` only while the task is not terminal; `false` if skipped
    async fn update_active_task(&self, id: &str, update: &TaskUpdate) -> Result<bool>;
    /// Newest first
    async fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> Result<Vec<Task>>;
}

/// Queue entries and the claim primitive
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn insert_entry(&self, entry: &QueueEntry) -> Result<()>;
    async fn get_entry(&self, id: &str) -> Result<Option<QueueEntry>>;
    /// Most recent entry for a task
    async fn entry_for_task(&self, task_id: &str) -> Result<Option<QueueEntry>>;
    async fn update_entry(&self, id: &str, update: &QueueUpdate) -> Result<()>;

    /// Due `queued` entries plus `processing` entries locked before
    /// `stale_before`, oldest first
    async fn claimable_entries(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueueEntry>>;

    /// Set `processing` + `new_lock`, only while the row still has
    /// `expected_status` and `expected_lock`
    ///
    /// Does not report whether the write applied. Callers confirm with a
    /// fresh `get_entry`.
    async fn claim_entry(
        &self,
        id: &str,
        expected_status: QueueStatus,
        expected_lock: Option<&Lock>,
        new_lock: &Lock,
    ) -> Result<()>;
}

/// Append-only event log
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append_event(&self, event: &Event) -> Result<()>;
    /// Oldest first
    async fn events_for_task(&self, task_id: &str) -> Result<Vec<Event>>;
}

/// Everything a worker needs
pub trait Store: TaskStore + QueueStore + EventStore {}

impl<T: TaskStore + QueueStore + EventStore> Store for T {}
