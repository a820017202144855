//! Queue worker tests
//!
//! Most tests drive `TaskWorker` with a scripted executor; the last group
//! runs the real `AgentRuntime` against a mocked provider.

use agenthub_agent::{
    AgentError, AgentRuntime, NoCapabilities, RunOutcome, TaskExecutor, TaskRequest,
};
use agenthub_provider::{ChatParams, ChatResponse, Provider, ProviderError};
use agenthub_store::{
    cancel_task, submit_task, Event, EventStore, EventType, Lock, MemoryStore, NewTask,
    QueueEntry, QueueStatus, QueueStore, QueueUpdate, Result as StoreResult, Store, Task,
    TaskStatus, TaskStore, TaskUpdate,
};
use agenthub_worker::TaskWorker;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use mockall::mock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Step = Box<dyn Fn() -> Result<RunOutcome, AgentError> + Send + Sync>;

/// Executor that replays canned outcomes and records what it was asked
struct ScriptedExecutor {
    store: Arc<MemoryStore>,
    steps: Mutex<VecDeque<Step>>,
    repeat: Option<Step>,
    cancel_during_run: bool,
    requests: Mutex<Vec<TaskRequest>>,
}

impl ScriptedExecutor {
    fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            steps: Mutex::new(VecDeque::new()),
            repeat: None,
            cancel_during_run: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn then(self, step: impl Fn() -> Result<RunOutcome, AgentError> + Send + Sync + 'static) -> Self {
        self.steps.lock().unwrap().push_back(Box::new(step));
        self
    }

    fn always(mut self, step: impl Fn() -> Result<RunOutcome, AgentError> + Send + Sync + 'static) -> Self {
        self.repeat = Some(Box::new(step));
        self
    }

    /// Cancel the task from "outside" while the run is in flight
    fn cancelling(mut self) -> Self {
        self.cancel_during_run = true;
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute(&self, request: TaskRequest) -> agenthub_agent::Result<RunOutcome> {
        self.requests.lock().unwrap().push(request.clone());

        if self.cancel_during_run {
            if let Some(id) = request.task_id.as_deref() {
                cancel_task(self.store.as_ref(), id).await.unwrap();
            }
        }

        let step = self.steps.lock().unwrap().pop_front();
        match (step, &self.repeat) {
            (Some(step), _) => step(),
            (None, Some(repeat)) => repeat(),
            (None, None) => panic!("executor called more often than scripted"),
        }
    }
}

/// Executor whose run panics with a fixed message
struct PanickingExecutor {
    message: &'static str,
}

#[async_trait]
impl TaskExecutor for PanickingExecutor {
    async fn execute(&self, _request: TaskRequest) -> agenthub_agent::Result<RunOutcome> {
        panic!("{}", self.message);
    }
}

/// Store that cancels a task right after handing out one read of it
struct CancelAfterRead {
    inner: Arc<MemoryStore>,
    armed: Mutex<bool>,
}

#[async_trait]
impl TaskStore for CancelAfterRead {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.inner.insert_task(task).await
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        let task = self.inner.get_task(id).await?;
        let fire = std::mem::take(&mut *self.armed.lock().unwrap());
        if fire {
            cancel_task(self.inner.as_ref(), id).await.unwrap();
        }
        Ok(task)
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> StoreResult<()> {
        self.inner.update_task(id, update).await
    }

    async fn update_active_task(&self, id: &str, update: &TaskUpdate) -> StoreResult<bool> {
        self.inner.update_active_task(id, update).await
    }

    async fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks(status, limit).await
    }
}

#[async_trait]
impl QueueStore for CancelAfterRead {
    async fn insert_entry(&self, entry: &QueueEntry) -> StoreResult<()> {
        self.inner.insert_entry(entry).await
    }

    async fn get_entry(&self, id: &str) -> StoreResult<Option<QueueEntry>> {
        self.inner.get_entry(id).await
    }

    async fn entry_for_task(&self, task_id: &str) -> StoreResult<Option<QueueEntry>> {
        self.inner.entry_for_task(task_id).await
    }

    async fn update_entry(&self, id: &str, update: &QueueUpdate) -> StoreResult<()> {
        self.inner.update_entry(id, update).await
    }

    async fn claimable_entries(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<QueueEntry>> {
        self.inner.claimable_entries(now, stale_before, limit).await
    }

    async fn claim_entry(
        &self,
        id: &str,
        expected_status: QueueStatus,
        expected_lock: Option<&Lock>,
        new_lock: &Lock,
    ) -> StoreResult<()> {
        self.inner
            .claim_entry(id, expected_status, expected_lock, new_lock)
            .await
    }
}

#[async_trait]
impl EventStore for CancelAfterRead {
    async fn append_event(&self, event: &Event) -> StoreResult<()> {
        self.inner.append_event(event).await
    }

    async fn events_for_task(&self, task_id: &str) -> StoreResult<Vec<Event>> {
        self.inner.events_for_task(task_id).await
    }
}

fn completed(result: &str) -> impl Fn() -> Result<RunOutcome, AgentError> + Send + Sync {
    let result = result.to_string();
    move || {
        Ok(RunOutcome::Completed {
            result: result.clone(),
            iterations: 1,
        })
    }
}

fn rate_limited() -> Result<RunOutcome, AgentError> {
    Err(AgentError::Provider(ProviderError::RateLimited))
}

async fn submit(store: &MemoryStore, agent: &str) -> Task {
    submit_task(store, NewTask::new(agent, "user-1", "Do the thing"), false)
        .await
        .unwrap()
}

async fn entry_of(store: &MemoryStore, task: &Task) -> QueueEntry {
    store.entry_for_task(&task.id).await.unwrap().unwrap()
}

async fn task_of(store: &MemoryStore, task: &Task) -> Task {
    store.get_task(&task.id).await.unwrap().unwrap()
}

fn worker(store: &Arc<MemoryStore>, executor: Arc<dyn TaskExecutor>, id: &str) -> TaskWorker {
    let store: Arc<dyn Store> = store.clone();
    TaskWorker::new(store, executor).with_worker_id(id)
}

// ========== Claim Tests ==========

/// Test a claimed entry is processing and held by the claimer
#[tokio::test]
async fn test_claim_marks_processing() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    let entry = worker(&store, executor, "w1")
        .claim_next()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.task_id.as_deref(), Some(task.id.as_str()));
    assert_eq!(entry.status, QueueStatus::Processing);
    assert!(entry.is_held_by("w1"));
}

/// Test only one of two racing workers owns the entry
#[tokio::test]
async fn test_single_owner_claim() {
    let store = Arc::new(MemoryStore::new());
    submit(&store, "bookkeeper").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    let w1 = worker(&store, executor.clone(), "w1");
    let w2 = worker(&store, executor, "w2");

    let (a, b) = tokio::join!(w1.claim_next(), w2.claim_next());
    let claimed: Vec<QueueEntry> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();

    assert_eq!(claimed.len(), 1);
    let stored = store.get_entry(&claimed[0].id).await.unwrap().unwrap();
    assert_eq!(stored.lock.unwrap().holder, claimed[0].lock.clone().unwrap().holder);
}

/// Test a fresh lock held by another worker is left alone
#[tokio::test]
async fn test_fresh_lock_not_reclaimed() {
    let store = Arc::new(MemoryStore::new());
    submit(&store, "bookkeeper").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    let first = worker(&store, executor.clone(), "w1").claim_next().await.unwrap();
    assert!(first.is_some());

    let second = worker(&store, executor, "w2").claim_next().await.unwrap();
    assert!(second.is_none());
}

/// Test a lock older than the TTL is taken over
#[tokio::test]
async fn test_stale_lock_reclaimed() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let mut entry = entry_of(&store, &task).await;
    let locked_at = Utc::now() - ChronoDuration::minutes(11);
    store
        .claim_entry(
            &entry.id,
            QueueStatus::Queued,
            None,
            &Lock::new("crashed-worker", locked_at),
        )
        .await
        .unwrap();
    entry = store.get_entry(&entry.id).await.unwrap().unwrap();
    assert!(entry.is_held_by("crashed-worker"));

    let executor = Arc::new(ScriptedExecutor::new(store.clone()));
    let claimed = worker(&store, executor, "w2")
        .claim_next()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(claimed.id, entry.id);
    assert!(claimed.is_held_by("w2"));
    assert!(claimed.lock.unwrap().locked_at > locked_at);
}

/// Test a custom lock TTL changes what counts as stale
#[tokio::test]
async fn test_custom_lock_ttl() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let entry = entry_of(&store, &task).await;
    store
        .claim_entry(
            &entry.id,
            QueueStatus::Queued,
            None,
            &Lock::new("other", Utc::now() - ChronoDuration::seconds(90)),
        )
        .await
        .unwrap();

    let executor = Arc::new(ScriptedExecutor::new(store.clone()));
    let default_ttl = worker(&store, executor.clone(), "w2");
    assert!(default_ttl.claim_next().await.unwrap().is_none());

    let short_ttl = worker(&store, executor, "w2").with_lock_ttl(Duration::from_secs(60));
    assert!(short_ttl.claim_next().await.unwrap().is_some());
}

/// Test entries scheduled in the future are not claimed
#[tokio::test]
async fn test_future_entry_not_claimed() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let entry = entry_of(&store, &task).await;
    store
        .update_entry(
            &entry.id,
            &agenthub_store::QueueUpdate::new().next_run_at(Utc::now() + ChronoDuration::minutes(1)),
        )
        .await
        .unwrap();

    let executor = Arc::new(ScriptedExecutor::new(store.clone()));
    assert!(worker(&store, executor, "w1")
        .claim_next()
        .await
        .unwrap()
        .is_none());
}

// ========== Process Tests ==========

/// Test a successful run completes the task and the entry
#[tokio::test]
async fn test_success_completes_task() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "inbox_commander").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()).then(completed("Inbox triaged")));
    let w = worker(&store, executor.clone(), "w1");

    assert!(w.run_once().await.unwrap());

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.result.as_deref(), Some("Inbox triaged"));
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
    assert!(stored.failure_code.is_none());

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert!(entry.lock.is_none());
    assert!(entry.processed_at.is_some());

    let requests = executor.requests.lock().unwrap();
    assert_eq!(requests[0].task_id.as_deref(), Some(task.id.as_str()));
    assert_eq!(requests[0].instruction, "Do the thing");
}

/// Test nothing to claim reports idle
#[tokio::test]
async fn test_run_once_idle() {
    let store = Arc::new(MemoryStore::new());
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));
    assert!(!worker(&store, executor, "w1").run_once().await.unwrap());
}

/// Test a 429 is retried with backoff until the budget is spent
#[tokio::test]
async fn test_rate_limit_retry_until_exhausted() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()).always(rate_limited));
    let w = worker(&store, executor.clone(), "w1");

    // first failure
    let before = Utc::now();
    let entry = w.claim_next().await.unwrap().unwrap();
    w.process_entry(&entry).await.unwrap();

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Queued);
    assert_eq!(entry.attempts, 1);
    assert!(entry.lock.is_none());
    assert!(entry.last_error.as_deref().unwrap().contains("429"));
    let delay = entry.next_run_at - before;
    assert!(delay >= ChronoDuration::seconds(15) && delay < ChronoDuration::seconds(20));

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Running);
    assert_eq!(stored.failure_code.as_deref(), Some("RATE_LIMITED"));
    assert!(stored.retryable);

    // second failure, processed directly since the entry is not due yet
    w.process_entry(&entry).await.unwrap();
    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Queued);
    assert_eq!(entry.attempts, 2);
    assert!(entry.next_run_at - Utc::now() > ChronoDuration::seconds(50));

    // third failure is final
    w.process_entry(&entry).await.unwrap();
    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.attempts, 3);
    assert!(entry.lock.is_none());

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.failure_code.as_deref(), Some("RATE_LIMITED"));
    assert!(stored.completed_at.is_some());
    assert_eq!(executor.calls(), 3);
}

/// Test attempts never exceed the entry's budget
#[tokio::test]
async fn test_attempts_capped() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()).always(rate_limited));
    let w = worker(&store, executor, "w1");

    let mut entry = entry_of(&store, &task).await;
    entry.attempts = 7;
    w.process_entry(&entry).await.unwrap();

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.attempts, entry.max_attempts);
    assert_eq!(entry.status, QueueStatus::Processed);
}

/// Test non-retryable failures fail on the first attempt
#[tokio::test]
async fn test_non_retryable_fails_immediately() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(
        ScriptedExecutor::new(store.clone())
            .then(|| Err(AgentError::Provider(ProviderError::NoApiKey))),
    );
    let w = worker(&store, executor, "w1");

    w.run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.failure_code.as_deref(), Some("CONFIG_MISSING"));
    assert!(!stored.retryable);
    assert_eq!(
        stored.error_detail.as_deref(),
        Some("ANTHROPIC_API_KEY not configured")
    );

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.attempts, 1);
}

/// Test running out of iterations fails the task as UNKNOWN
#[tokio::test]
async fn test_max_iterations_outcome() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(
        ScriptedExecutor::new(store.clone())
            .then(|| Ok(RunOutcome::MaxIterations { iterations: 10 })),
    );

    worker(&store, executor, "w1").run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.failure_code.as_deref(), Some("UNKNOWN"));
    assert_eq!(stored.error_detail.as_deref(), Some("Max iterations reached"));
}

/// Test an unexpected stop reason fails like exhaustion, without a retry
#[tokio::test]
async fn test_stopped_outcome() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()).then(|| {
        Ok(RunOutcome::Stopped {
            stop_reason: "max_tokens".to_string(),
            iterations: 1,
        })
    }));

    worker(&store, executor, "w1").run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.failure_code.as_deref(), Some("UNKNOWN"));
    assert!(!stored.retryable);
    assert_eq!(stored.error_detail.as_deref(), Some("Model stopped: max_tokens"));
    assert_eq!(entry_of(&store, &task).await.status, QueueStatus::Processed);
}

/// Test an unknown agent fails on the first attempt without running
#[tokio::test]
async fn test_unknown_agent() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "nonexistent").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    worker(&store, executor.clone(), "w1").run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.failure_code.as_deref(), Some("UNKNOWN_AGENT"));
    assert!(!stored.retryable);
    assert_eq!(
        stored.error_detail.as_deref(),
        Some("Unknown agent type: nonexistent")
    );
    assert!(stored.completed_at.is_some());

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.attempts, 0);
    assert_eq!(executor.calls(), 0);
}

/// Test an entry without a task is retired
#[tokio::test]
async fn test_entry_without_task_id() {
    let store = Arc::new(MemoryStore::new());
    let entry = QueueEntry::new(None, 3, Utc::now());
    store.insert_entry(&entry).await.unwrap();
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    worker(&store, executor, "w1").run_once().await.unwrap();

    let entry = store.get_entry(&entry.id).await.unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.last_error.as_deref(), Some("Queue entry missing task_id"));
}

/// Test an entry pointing at a missing task is retired
#[tokio::test]
async fn test_entry_with_missing_task() {
    let store = Arc::new(MemoryStore::new());
    let entry = QueueEntry::for_task("ghost", 3, Utc::now());
    store.insert_entry(&entry).await.unwrap();
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    worker(&store, executor, "w1").run_once().await.unwrap();

    let entry = store.get_entry(&entry.id).await.unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.last_error.as_deref(), Some("Task ghost not found"));
}

/// Test a task cancelled before pickup is not run
#[tokio::test]
async fn test_terminal_task_skipped() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    cancel_task(store.as_ref(), &task.id).await.unwrap();
    let executor = Arc::new(ScriptedExecutor::new(store.clone()));

    worker(&store, executor.clone(), "w1").run_once().await.unwrap();

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.last_error.as_deref(), Some("Task already cancelled"));
    assert_eq!(task_of(&store, &task).await.status, TaskStatus::Cancelled);
    assert_eq!(executor.calls(), 0);
}

/// Test a cancelled run records the cancellation without touching status
#[tokio::test]
async fn test_cancelled_outcome() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(
        ScriptedExecutor::new(store.clone())
            .cancelling()
            .then(|| Ok(RunOutcome::Cancelled { iterations: 1 })),
    );

    worker(&store, executor, "w1").run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Cancelled);
    assert_eq!(stored.failure_code.as_deref(), Some("TASK_CANCELLED"));
    assert!(stored.result.is_none());

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.attempts, 0);
}

/// Test a completing run never overwrites a cancellation
#[tokio::test]
async fn test_cancellation_not_overwritten_by_completion() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(
        ScriptedExecutor::new(store.clone())
            .cancelling()
            .then(completed("should not be saved")),
    );

    worker(&store, executor, "w1").run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Cancelled);
    assert!(stored.result.is_none());
    assert_eq!(entry_of(&store, &task).await.status, QueueStatus::Processed);
}

/// Test a failing run never overwrites a cancellation
#[tokio::test]
async fn test_cancellation_not_overwritten_by_failure() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(
        ScriptedExecutor::new(store.clone())
            .cancelling()
            .then(|| Err(AgentError::Provider(ProviderError::NoApiKey))),
    );

    worker(&store, executor, "w1").run_once().await.unwrap();

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Cancelled);
    assert!(stored.failure_code.is_none());
}

/// Test a panicking run fails the task and counts the attempt
#[tokio::test]
async fn test_executor_panic_fails_task() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(PanickingExecutor {
        message: "capability blew up",
    });
    let w = worker(&store, executor, "w1");

    assert!(w.run_once().await.unwrap());

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.failure_code.as_deref(), Some("UNKNOWN"));
    assert!(!stored.retryable);
    assert_eq!(
        stored.error_detail.as_deref(),
        Some("Task panicked: capability blew up")
    );

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.attempts, 1);
    assert!(entry.lock.is_none());
}

/// Test a panic whose message looks transient is retried with backoff
#[tokio::test]
async fn test_executor_panic_with_retryable_message() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "bookkeeper").await;
    let executor = Arc::new(PanickingExecutor {
        message: "upstream returned 503",
    });
    let w = worker(&store, executor, "w1");

    let before = Utc::now();
    assert!(w.run_once().await.unwrap());

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Queued);
    assert_eq!(entry.attempts, 1);
    assert!(entry.lock.is_none());
    assert!(entry.next_run_at >= before + ChronoDuration::seconds(15));

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.failure_code.as_deref(), Some("PROVIDER_ERROR"));
    assert!(stored.retryable);
}

/// Test a cancel landing between the task read and the start write is kept
#[tokio::test]
async fn test_cancel_before_start_is_kept() {
    let inner = Arc::new(MemoryStore::new());
    let task = submit(&inner, "bookkeeper").await;
    let store: Arc<dyn Store> = Arc::new(CancelAfterRead {
        inner: inner.clone(),
        armed: Mutex::new(true),
    });
    let executor = Arc::new(ScriptedExecutor::new(inner.clone()).always(completed("done")));
    let w = TaskWorker::new(store, executor.clone()).with_worker_id("w1");

    assert!(w.run_once().await.unwrap());

    assert_eq!(executor.calls(), 0);
    let stored = task_of(&inner, &task).await;
    assert_eq!(stored.status, TaskStatus::Cancelled);
    assert!(stored.started_at.is_none());
    assert!(stored.result.is_none());

    let entry = entry_of(&inner, &task).await;
    assert_eq!(entry.status, QueueStatus::Processed);
    assert_eq!(entry.last_error.as_deref(), Some("Task already cancelled"));
}

// ========== Loop Tests ==========

/// Test the loop drains the queue and stops on shutdown
#[tokio::test]
async fn test_run_until_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let first = submit(&store, "bookkeeper").await;
    let second = submit(&store, "appointment").await;
    let executor = Arc::new(ScriptedExecutor::new(store.clone()).always(completed("done")));
    let w = Arc::new(
        worker(&store, executor.clone(), "w1").with_poll_interval(Duration::from_millis(10)),
    );

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let w = w.clone();
        let shutdown = shutdown.clone();
        async move { w.run(shutdown).await }
    });

    for _ in 0..200 {
        if task_of(&store, &second).await.status == TaskStatus::Completed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker did not stop")
        .unwrap();

    assert_eq!(task_of(&store, &first).await.status, TaskStatus::Completed);
    assert_eq!(task_of(&store, &second).await.status, TaskStatus::Completed);
    assert_eq!(executor.calls(), 2);
}

/// Test a panicking run does not end the loop
#[tokio::test]
async fn test_run_survives_executor_panic() {
    let store = Arc::new(MemoryStore::new());
    let first = submit(&store, "bookkeeper").await;
    let second = submit(&store, "appointment").await;
    let executor = Arc::new(PanickingExecutor { message: "boom" });
    let w = Arc::new(
        worker(&store, executor, "w1").with_poll_interval(Duration::from_millis(10)),
    );

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let w = w.clone();
        let shutdown = shutdown.clone();
        async move { w.run(shutdown).await }
    });

    for _ in 0..200 {
        if task_of(&store, &second).await.status == TaskStatus::Failed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!handle.is_finished());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker did not stop")
        .unwrap();

    for task in [&first, &second] {
        assert_eq!(task_of(&store, task).await.status, TaskStatus::Failed);
        let entry = entry_of(&store, task).await;
        assert_eq!(entry.status, QueueStatus::Processed);
        assert_eq!(entry.attempts, 1);
    }
}

// ========== Runtime Integration Tests ==========

mock! {
    pub Provider {}

    #[async_trait]
    impl Provider for Provider {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn name(&self) -> &str;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

/// Test a queued task runs through the real runtime to completion
#[tokio::test]
async fn test_end_to_end_with_runtime() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "customer_care").await;

    let mut provider = MockProvider::new();
    provider.expect_name().return_const("anthropic".to_string());
    provider
        .expect_chat()
        .times(1)
        .returning(|_| Ok(ChatResponse::text("Ticket answered.").with_usage(40, 12)));

    let runtime = AgentRuntime::new(
        Arc::new(provider),
        store.clone(),
        Arc::new(NoCapabilities),
    );
    let w = worker(&store, Arc::new(runtime), "w1");

    assert!(w.run_once().await.unwrap());

    let stored = task_of(&store, &task).await;
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.result.as_deref(), Some("Ticket answered."));
    assert_eq!(stored.total_tokens, Some(52));
    assert_eq!(stored.model_provider.as_deref(), Some("anthropic"));

    let events = store.events_for_task(&task.id).await.unwrap();
    assert_eq!(events.first().unwrap().event_type, EventType::TaskStarted);
    assert_eq!(events.last().unwrap().event_type, EventType::TaskCompleted);
}

/// Test provider rate limiting through the real runtime is requeued
#[tokio::test]
async fn test_end_to_end_rate_limited() {
    let store = Arc::new(MemoryStore::new());
    let task = submit(&store, "customer_care").await;

    let mut provider = MockProvider::new();
    provider.expect_name().return_const("anthropic".to_string());
    provider.expect_chat().times(1).returning(|_| {
        Err(ProviderError::Api {
            status: 429,
            message: "rate_limit_error".to_string(),
        })
    });

    let runtime = AgentRuntime::new(
        Arc::new(provider),
        store.clone(),
        Arc::new(NoCapabilities),
    );
    worker(&store, Arc::new(runtime), "w1")
        .run_once()
        .await
        .unwrap();

    let entry = entry_of(&store, &task).await;
    assert_eq!(entry.status, QueueStatus::Queued);
    assert_eq!(entry.attempts, 1);
    assert_eq!(
        task_of(&store, &task).await.failure_code.as_deref(),
        Some("RATE_LIMITED")
    );
}
