//! Queue worker - claims entries and drives them to a final state

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use agenthub_agent::{AgentType, RunOutcome, TaskExecutor, TaskRequest};
use agenthub_config::WorkerConfig;
use agenthub_store::{
    Lock, QueueEntry, QueueStatus, QueueStore, QueueUpdate, Store, StoreError, Task, TaskStatus,
    TaskStore, TaskUpdate,
};

use crate::backoff;
use crate::failure::{self, FailureCode, FailureInfo};
use crate::Result;

/// Environment override for the worker identity
pub const WORKER_ID_ENV: &str = "WORKER_ID";

/// Lock holder name: explicit override, then `WORKER_ID`, then `host:pid`
pub fn worker_id(configured: Option<&str>) -> String {
    if let Some(id) = configured.filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    match std::env::var(WORKER_ID_ENV) {
        Ok(id) if !id.is_empty() => id,
        _ => format!("{}:{}", hostname(), std::process::id()),
    }
}

fn hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Single-entry-at-a-time queue consumer
pub struct TaskWorker {
    store: Arc<dyn Store>,
    executor: Arc<dyn TaskExecutor>,
    worker_id: String,
    poll_interval: Duration,
    batch_size: usize,
    lock_ttl: Duration,
}

impl TaskWorker {
    pub fn new(store: Arc<dyn Store>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self::from_config(store, executor, &WorkerConfig::default())
    }

    pub fn from_config(
        store: Arc<dyn Store>,
        executor: Arc<dyn TaskExecutor>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            executor,
            worker_id: worker_id(config.worker_id.as_deref()),
            poll_interval: config.poll_interval(),
            batch_size: config.claim_batch_size.max(1),
            lock_ttl: config.lock_ttl(),
        }
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.lock_ttl)
            .unwrap_or_else(|_| chrono::Duration::minutes(10));
        now - ttl
    }

    /// Claim the oldest runnable entry, or `None` if nothing could be claimed
    ///
    /// The claim is a guarded write followed by a re-read; the entry is
    /// ours only if the re-read shows our lock.
    pub async fn claim_next(&self) -> Result<Option<QueueEntry>> {
        let now = Utc::now();
        let stale_before = self.stale_before(now);
        let candidates = self
            .store
            .claimable_entries(now, stale_before, self.batch_size)
            .await?;

        for candidate in candidates {
            if let Some(lock) = &candidate.lock {
                if lock.holder != self.worker_id && !lock.is_stale(stale_before) {
                    continue;
                }
            }

            let new_lock = Lock::new(self.worker_id.clone(), Utc::now());
            self.store
                .claim_entry(
                    &candidate.id,
                    candidate.status,
                    candidate.lock.as_ref(),
                    &new_lock,
                )
                .await?;

            let Some(confirmed) = self.store.get_entry(&candidate.id).await? else {
                continue;
            };
            if confirmed.status == QueueStatus::Processing && confirmed.is_held_by(&self.worker_id)
            {
                if let Some(previous) = &candidate.lock {
                    warn!(
                        entry_id = %confirmed.id,
                        previous_holder = %previous.holder,
                        worker_id = %self.worker_id,
                        "reclaimed stale lock"
                    );
                }
                info!(entry_id = %confirmed.id, worker_id = %self.worker_id, "claimed entry");
                return Ok(Some(confirmed));
            }
            debug!(entry_id = %candidate.id, "lost claim race");
        }

        Ok(None)
    }

    async fn finish_entry(&self, entry_id: &str, last_error: Option<&str>) -> Result<()> {
        let mut update = QueueUpdate::new().processed(Utc::now()).clear_lock();
        update = match last_error {
            Some(message) => update.last_error(message),
            None => update.clear_last_error(),
        };
        self.store.update_entry(entry_id, &update).await?;
        Ok(())
    }

    /// Run one claimed entry to completion, retry or failure
    pub async fn process_entry(&self, entry: &QueueEntry) -> Result<()> {
        let Some(task_id) = entry.task_id.as_deref() else {
            warn!(entry_id = %entry.id, "queue entry has no task");
            return self
                .finish_entry(&entry.id, Some("Queue entry missing task_id"))
                .await;
        };

        let Some(task) = self.store.get_task(task_id).await? else {
            warn!(entry_id = %entry.id, task_id, "task not found");
            return self
                .finish_entry(&entry.id, Some(&format!("Task {} not found", task_id)))
                .await;
        };

        if task.status.is_terminal() {
            info!(entry_id = %entry.id, task_id, status = %task.status, "task already finished");
            return self
                .finish_entry(&entry.id, Some(&format!("Task already {}", task.status)))
                .await;
        }

        if task.started_at.is_none() {
            let started = self
                .update_if_active(
                    task_id,
                    &TaskUpdate::new()
                        .status(TaskStatus::Running)
                        .started_at(Utc::now()),
                )
                .await?;
            if !started {
                let status = match self.store.get_task(task_id).await? {
                    Some(current) => current.status.to_string(),
                    None => "removed".to_string(),
                };
                info!(entry_id = %entry.id, task_id, %status, "task finished before start");
                return self
                    .finish_entry(&entry.id, Some(&format!("Task already {}", status)))
                    .await;
            }
        }

        let agent = match task.agent_type.parse::<AgentType>() {
            Ok(agent) => agent,
            Err(e) => {
                warn!(task_id, agent_type = %task.agent_type, "unknown agent type");
                self.update_if_active(
                    task_id,
                    &TaskUpdate::new()
                        .status(TaskStatus::Failed)
                        .failure(FailureCode::UnknownAgent.as_str(), false, e.to_string())
                        .completed_at(Utc::now()),
                )
                .await?;
                return self.finish_entry(&entry.id, None).await;
            }
        };

        info!(task_id, agent = %agent, attempt = entry.attempts + 1, "executing task");
        let outcome = match self.execute_isolated(request_for(&task, agent)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = join_failure_message(e);
                error!(task_id, entry_id = %entry.id, error = %message, "executor panicked");
                return self.fail(entry, task_id, failure::classify(&message)).await;
            }
        };

        match outcome {
            Ok(RunOutcome::Completed { result, iterations }) => {
                self.complete(entry, &task, result, iterations).await
            }
            Ok(RunOutcome::Cancelled { .. }) => {
                info!(task_id, "run stopped by cancellation");
                let info = FailureInfo::new(FailureCode::TaskCancelled, "Task cancelled");
                self.store
                    .update_task(
                        task_id,
                        &TaskUpdate::new().failure(info.code.as_str(), info.retryable, &info.message),
                    )
                    .await?;
                self.finish_entry(&entry.id, Some(&info.message)).await
            }
            Ok(other) => {
                let message = other.error().unwrap_or_else(|| "Task failed".to_string());
                self.fail(entry, task_id, failure::classify(&message)).await
            }
            Err(e) => {
                warn!(task_id, error = %e, "run failed");
                self.fail(entry, task_id, failure::classify_error(&e)).await
            }
        }
    }

    /// Guarded task write; a task that has vanished counts as finished
    async fn update_if_active(&self, task_id: &str, update: &TaskUpdate) -> Result<bool> {
        match self.store.update_active_task(task_id, update).await {
            Ok(applied) => Ok(applied),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Run the executor on its own task so a panic ends only this run
    async fn execute_isolated(
        &self,
        request: TaskRequest,
    ) -> std::result::Result<agenthub_agent::Result<RunOutcome>, JoinError> {
        let executor = self.executor.clone();
        tokio::spawn(async move { executor.execute(request).await }).await
    }

    async fn complete(
        &self,
        entry: &QueueEntry,
        task: &Task,
        result: String,
        iterations: u32,
    ) -> Result<()> {
        let applied = self
            .update_if_active(
                &task.id,
                &TaskUpdate::new()
                    .status(TaskStatus::Completed)
                    .completed_at(Utc::now())
                    .result(result)
                    .clear_failure(),
            )
            .await?;
        if applied {
            info!(task_id = %task.id, iterations, "task completed");
        } else {
            info!(task_id = %task.id, "task finished elsewhere, result discarded");
        }
        self.finish_entry(&entry.id, None).await
    }

    async fn fail(&self, entry: &QueueEntry, task_id: &str, info: FailureInfo) -> Result<()> {
        let attempts = (entry.attempts + 1).min(entry.max_attempts);
        let record = TaskUpdate::new().failure(info.code.as_str(), info.retryable, &info.message);

        if info.retryable && attempts < entry.max_attempts {
            self.update_if_active(task_id, &record).await?;

            let next_run_at = backoff::next_run_at(attempts, Utc::now());
            self.store
                .update_entry(
                    &entry.id,
                    &QueueUpdate::new()
                        .status(QueueStatus::Queued)
                        .attempts(attempts)
                        .next_run_at(next_run_at)
                        .last_error(info.message.as_str())
                        .clear_lock(),
                )
                .await?;
            info!(
                task_id,
                entry_id = %entry.id,
                attempt = attempts,
                code = %info.code,
                %next_run_at,
                "task requeued"
            );
            return Ok(());
        }

        self.update_if_active(
            task_id,
            &record
                .status(TaskStatus::Failed)
                .completed_at(Utc::now()),
        )
        .await?;
        self.store
            .update_entry(
                &entry.id,
                &QueueUpdate::new()
                    .processed(Utc::now())
                    .attempts(attempts)
                    .last_error(info.message.as_str())
                    .clear_lock(),
            )
            .await?;
        warn!(task_id, attempt = attempts, code = %info.code, "task failed");
        Ok(())
    }

    /// Claim and process at most one entry; `true` if one was processed
    pub async fn run_once(&self) -> Result<bool> {
        match self.claim_next().await? {
            Some(entry) => {
                self.process_entry(&entry).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Poll until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            worker_id = %self.worker_id,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "worker started"
        );

        while !shutdown.is_cancelled() {
            let idle = match self.run_once().await {
                Ok(processed) => !processed,
                Err(e) => {
                    error!(worker_id = %self.worker_id, error = %e, "worker cycle failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        info!(worker_id = %self.worker_id, "worker stopped");
    }
}

fn join_failure_message(e: JoinError) -> String {
    if !e.is_panic() {
        return format!("Task execution aborted: {}", e);
    }
    let payload = e.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("Task panicked: {}", detail)
}

fn request_for(task: &Task, agent: AgentType) -> TaskRequest {
    TaskRequest::new(agent, &task.user_id, &task.instruction)
        .with_context(task.context.clone())
        .with_task_id(&task.id)
}
