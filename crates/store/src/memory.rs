//! In-process store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::trace;

use crate::model::{Event, Lock, QueueEntry, QueueStatus, QueueUpdate, Task, TaskStatus, TaskUpdate};
use crate::{EventStore, QueueStore, Result, StoreError, TaskStore};

#[derive(Default)]
struct Tables {
    tasks: HashMap<String, Task>,
    entries: HashMap<String, QueueEntry>,
    events: Vec<Event>,
}

/// Mutex-guarded maps; nothing survives the process
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: &Task) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let tables = self.tables.lock().await;
        Ok(tables.tasks.get(id).cloned())
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let task = tables
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        update.apply(task);
        Ok(())
    }

    async fn update_active_task(&self, id: &str, update: &TaskUpdate) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let task = tables
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        if task.status.is_terminal() {
            return Ok(false);
        }
        update.apply(task);
        Ok(true)
    }

    async fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> Result<Vec<Task>> {
        let tables = self.tables.lock().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|task| status.map_or(true, |s| task.status == s))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks.truncate(limit);
        Ok(tasks)
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn insert_entry(&self, entry: &QueueEntry) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn get_entry(&self, id: &str) -> Result<Option<QueueEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables.entries.get(id).cloned())
    }

    async fn entry_for_task(&self, task_id: &str) -> Result<Option<QueueEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .entries
            .values()
            .filter(|entry| entry.task_id.as_deref() == Some(task_id))
            .max_by_key(|entry| entry.created_at)
            .cloned())
    }

    async fn update_entry(&self, id: &str, update: &QueueUpdate) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let entry = tables
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::entry_not_found(id))?;
        update.apply(entry);
        Ok(())
    }

    async fn claimable_entries(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueueEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<QueueEntry> = tables
            .entries
            .values()
            .filter(|entry| entry.is_claimable(now, stale_before))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn claim_entry(
        &self,
        id: &str,
        expected_status: QueueStatus,
        expected_lock: Option<&Lock>,
        new_lock: &Lock,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(entry) = tables.entries.get_mut(id) {
            if entry.status == expected_status && entry.lock.as_ref() == expected_lock {
                entry.status = QueueStatus::Processing;
                entry.lock = Some(new_lock.clone());
            } else {
                trace!(entry_id = id, "claim guard did not match");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append_event(&self, event: &Event) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.events.push(event.clone());
        Ok(())
    }

    async fn events_for_task(&self, task_id: &str) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .events
            .iter()
            .filter(|event| event.task_id == task_id)
            .cloned()
            .collect())
    }
}
