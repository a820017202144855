//! Submitter-side task transitions
//!
//! Creating, approving, rejecting and cancelling tasks. Workers never call
//! these; they own the queue entry transitions instead.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::model::{NewTask, QueueEntry, Task, TaskStatus, TaskUpdate, DEFAULT_MAX_ATTEMPTS};
use crate::{QueueStore, Store, StoreError, TaskStore};

/// Errors in submitter operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("cannot {action} task {id}: status is {status}")]
    InvalidTransition {
        id: String,
        status: TaskStatus,
        action: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

async fn load(store: &dyn Store, id: &str) -> Result<Task> {
    store
        .get_task(id)
        .await?
        .ok_or_else(|| LifecycleError::TaskNotFound(id.to_string()))
}

/// Insert a task and, unless it needs approval, queue it
pub async fn submit_task(store: &dyn Store, new: NewTask, requires_approval: bool) -> Result<Task> {
    let max_attempts = new.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
    let status = if requires_approval {
        TaskStatus::AwaitingApproval
    } else {
        TaskStatus::Pending
    };

    let task = Task::new(new, status, Utc::now());
    store.insert_task(&task).await?;
    info!(task_id = %task.id, agent = %task.agent_type, status = %task.status, "task submitted");

    if requires_approval {
        return Ok(task);
    }

    enqueue(store, &task.id, max_attempts).await?;
    load(store, &task.id).await
}

/// Approve or reject a task waiting on a human
pub async fn review_task(
    store: &dyn Store,
    id: &str,
    approved: bool,
    feedback: Option<String>,
) -> Result<Task> {
    let task = load(store, id).await?;
    if task.status != TaskStatus::AwaitingApproval {
        return Err(LifecycleError::InvalidTransition {
            id: id.to_string(),
            status: task.status,
            action: if approved { "approve" } else { "reject" },
        });
    }

    let now = Utc::now();
    let update = if approved {
        TaskUpdate::new()
            .status(TaskStatus::Approved)
            .approved_at(now)
            .approval_feedback(feedback)
    } else {
        TaskUpdate::new()
            .status(TaskStatus::Rejected)
            .rejected_at(now)
            .approval_feedback(feedback)
    };
    store.update_task(id, &update).await?;
    info!(task_id = id, approved, "task reviewed");

    if approved {
        enqueue(store, id, DEFAULT_MAX_ATTEMPTS).await?;
    }

    load(store, id).await
}

/// Mark a task cancelled; a running worker notices before its next model call
pub async fn cancel_task(store: &dyn Store, id: &str) -> Result<Task> {
    let task = load(store, id).await?;
    if task.status.is_terminal() {
        return Err(LifecycleError::InvalidTransition {
            id: id.to_string(),
            status: task.status,
            action: "cancel",
        });
    }

    let applied = store
        .update_active_task(
            id,
            &TaskUpdate::new()
                .status(TaskStatus::Cancelled)
                .completed_at(Utc::now()),
        )
        .await?;
    if !applied {
        let current = load(store, id).await?;
        return Err(LifecycleError::InvalidTransition {
            id: id.to_string(),
            status: current.status,
            action: "cancel",
        });
    }
    info!(task_id = id, "task cancelled");

    load(store, id).await
}

/// Create the queue entry for a task and mark it queued
pub async fn enqueue(store: &dyn Store, task_id: &str, max_attempts: u32) -> Result<QueueEntry> {
    let entry = QueueEntry::for_task(task_id, max_attempts.max(1), Utc::now());
    store.insert_entry(&entry).await?;
    store
        .update_task(task_id, &TaskUpdate::new().status(TaskStatus::Queued))
        .await?;
    info!(task_id, entry_id = %entry.id, "task queued");
    Ok(entry)
}
