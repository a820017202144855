//! Task, queue entry and event records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::StoreError;

/// Default retry budget for a queue entry
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    AwaitingApproval,
    Approved,
    Rejected,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::AwaitingApproval => "awaiting_approval",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// No worker may move a task out of these states
    pub const TERMINAL: [TaskStatus; 4] = [
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
        TaskStatus::Rejected,
    ];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "awaiting_approval" => Ok(TaskStatus::AwaitingApproval),
            "approved" => Ok(TaskStatus::Approved),
            "rejected" => Ok(TaskStatus::Rejected),
            "queued" => Ok(TaskStatus::Queued),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(StoreError::Corrupt(format!("unknown task status: {}", other))),
        }
    }
}

/// Fields supplied by a submitter
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub agent_type: String,
    pub user_id: String,
    pub instruction: String,
    pub context: Value,
    pub max_attempts: Option<u32>,
}

impl NewTask {
    pub fn new(
        agent_type: impl Into<String>,
        user_id: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            agent_type: agent_type.into(),
            user_id: user_id.into(),
            instruction: instruction.into(),
            context: Value::Object(Default::default()),
            max_attempts: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// A unit of work for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Agent type as submitted; resolved by the worker
    pub agent_type: String,
    pub user_id: String,
    pub instruction: String,
    #[serde(default)]
    pub context: Value,
    pub status: TaskStatus,
    pub failure_code: Option<String>,
    #[serde(default)]
    pub retryable: bool,
    pub error_detail: Option<String>,
    pub result: Option<String>,
    pub approval_feedback: Option<String>,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub duration_ms: Option<u64>,
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(new: NewTask, status: TaskStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            agent_type: new.agent_type,
            user_id: new.user_id,
            instruction: new.instruction,
            context: new.context,
            status,
            failure_code: None,
            retryable: false,
            error_detail: None,
            result: None,
            approval_feedback: None,
            input_tokens: None,
            output_tokens: None,
            total_tokens: None,
            duration_ms: None,
            model_provider: None,
            model_name: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            approved_at: None,
            rejected_at: None,
        }
    }
}

/// Partial task write
///
/// `None` leaves a field untouched. Nullable fields take `Some(None)` to
/// clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub failure_code: Option<Option<String>>,
    pub retryable: Option<bool>,
    pub error_detail: Option<Option<String>>,
    pub result: Option<Option<String>>,
    pub approval_feedback: Option<Option<String>>,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub duration_ms: Option<u64>,
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn failure(
        mut self,
        code: impl Into<String>,
        retryable: bool,
        detail: impl Into<String>,
    ) -> Self {
        self.failure_code = Some(Some(code.into()));
        self.retryable = Some(retryable);
        self.error_detail = Some(Some(detail.into()));
        self
    }

    pub fn clear_failure(mut self) -> Self {
        self.failure_code = Some(None);
        self.retryable = Some(false);
        self.error_detail = Some(None);
        self
    }

    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(Some(result.into()));
        self
    }

    pub fn approval_feedback(mut self, feedback: Option<String>) -> Self {
        self.approval_feedback = Some(feedback);
        self
    }

    pub fn usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self.total_tokens = Some(input_tokens.saturating_add(output_tokens));
        self
    }

    pub fn run_metadata(
        mut self,
        duration_ms: u64,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.duration_ms = Some(duration_ms);
        self.model_provider = Some(provider.into());
        self.model_name = Some(model.into());
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(Some(at));
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(Some(at));
        self
    }

    pub fn approved_at(mut self, at: DateTime<Utc>) -> Self {
        self.approved_at = Some(at);
        self
    }

    pub fn rejected_at(mut self, at: DateTime<Utc>) -> Self {
        self.rejected_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(code) = &self.failure_code {
            task.failure_code = code.clone();
        }
        if let Some(retryable) = self.retryable {
            task.retryable = retryable;
        }
        if let Some(detail) = &self.error_detail {
            task.error_detail = detail.clone();
        }
        if let Some(result) = &self.result {
            task.result = result.clone();
        }
        if let Some(feedback) = &self.approval_feedback {
            task.approval_feedback = feedback.clone();
        }
        if let Some(n) = self.input_tokens {
            task.input_tokens = Some(n);
        }
        if let Some(n) = self.output_tokens {
            task.output_tokens = Some(n);
        }
        if let Some(n) = self.total_tokens {
            task.total_tokens = Some(n);
        }
        if let Some(ms) = self.duration_ms {
            task.duration_ms = Some(ms);
        }
        if let Some(provider) = &self.model_provider {
            task.model_provider = Some(provider.clone());
        }
        if let Some(model) = &self.model_name {
            task.model_name = Some(model.clone());
        }
        if let Some(at) = self.started_at {
            task.started_at = at;
        }
        if let Some(at) = self.completed_at {
            task.completed_at = at;
        }
        if let Some(at) = self.approved_at {
            task.approved_at = Some(at);
        }
        if let Some(at) = self.rejected_at {
            task.rejected_at = Some(at);
        }
    }
}

/// Queue entry state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Processing,
    Processed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Processing => "processing",
            QueueStatus::Processed => "processed",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(QueueStatus::Queued),
            "processing" => Ok(QueueStatus::Processing),
            "processed" => Ok(QueueStatus::Processed),
            other => Err(StoreError::Corrupt(format!("unknown queue status: {}", other))),
        }
    }
}

/// Ownership marker written by a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub holder: String,
    pub locked_at: DateTime<Utc>,
}

impl Lock {
    pub fn new(holder: impl Into<String>, locked_at: DateTime<Utc>) -> Self {
        Self {
            holder: holder.into(),
            locked_at,
        }
    }

    pub fn is_stale(&self, stale_before: DateTime<Utc>) -> bool {
        self.locked_at < stale_before
    }
}

/// Schedulable record pointing at a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: String,
    pub task_id: Option<String>,
    pub status: QueueStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub next_run_at: DateTime<Utc>,
    pub lock: Option<Lock>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl QueueEntry {
    /// Fresh entry, runnable at `now`
    pub fn new(task_id: Option<String>, max_attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            task_id,
            status: QueueStatus::Queued,
            attempts: 0,
            max_attempts,
            next_run_at: now,
            lock: None,
            last_error: None,
            created_at: now,
            processed_at: None,
        }
    }

    pub fn for_task(task_id: impl Into<String>, max_attempts: u32, now: DateTime<Utc>) -> Self {
        Self::new(Some(task_id.into()), max_attempts, now)
    }

    /// Ready to run, or held by a lock that went stale
    ///
    /// A `processing` entry with no lock at all is treated as reclaimable.
    pub fn is_claimable(&self, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> bool {
        match self.status {
            QueueStatus::Queued => self.next_run_at <= now,
            QueueStatus::Processing => self
                .lock
                .as_ref()
                .map_or(true, |lock| lock.is_stale(stale_before)),
            QueueStatus::Processed => false,
        }
    }

    pub fn is_held_by(&self, holder: &str) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.holder == holder)
    }
}

/// Partial queue entry write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueUpdate {
    pub status: Option<QueueStatus>,
    pub attempts: Option<u32>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub lock: Option<Option<Lock>>,
    pub last_error: Option<Option<String>>,
    pub processed_at: Option<Option<DateTime<Utc>>>,
}

impl QueueUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: QueueStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn next_run_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_run_at = Some(at);
        self
    }

    /// Move to `processing` under `holder`
    pub fn claim(mut self, holder: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.status = Some(QueueStatus::Processing);
        self.lock = Some(Some(Lock::new(holder, at)));
        self
    }

    pub fn clear_lock(mut self) -> Self {
        self.lock = Some(None);
        self
    }

    pub fn last_error(mut self, error: impl Into<String>) -> Self {
        self.last_error = Some(Some(error.into()));
        self
    }

    pub fn clear_last_error(mut self) -> Self {
        self.last_error = Some(None);
        self
    }

    /// Move to `processed` at `at`
    pub fn processed(mut self, at: DateTime<Utc>) -> Self {
        self.status = Some(QueueStatus::Processed);
        self.processed_at = Some(Some(at));
        self
    }

    pub fn apply(&self, entry: &mut QueueEntry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(attempts) = self.attempts {
            entry.attempts = attempts;
        }
        if let Some(at) = self.next_run_at {
            entry.next_run_at = at;
        }
        if let Some(lock) = &self.lock {
            entry.lock = lock.clone();
        }
        if let Some(error) = &self.last_error {
            entry.last_error = error.clone();
        }
        if let Some(at) = self.processed_at {
            entry.processed_at = at;
        }
    }
}

/// Lifecycle event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TaskStarted,
    ModelCallStarted,
    ModelCallCompleted,
    ToolCalled,
    ToolResult,
    TaskCompleted,
    TaskFailed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TaskStarted => "task_started",
            EventType::ModelCallStarted => "model_call_started",
            EventType::ModelCallCompleted => "model_call_completed",
            EventType::ToolCalled => "tool_called",
            EventType::ToolResult => "tool_result",
            EventType::TaskCompleted => "task_completed",
            EventType::TaskFailed => "task_failed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task_started" => Ok(EventType::TaskStarted),
            "model_call_started" => Ok(EventType::ModelCallStarted),
            "model_call_completed" => Ok(EventType::ModelCallCompleted),
            "tool_called" => Ok(EventType::ToolCalled),
            "tool_result" => Ok(EventType::ToolResult),
            "task_completed" => Ok(EventType::TaskCompleted),
            "task_failed" => Ok(EventType::TaskFailed),
            other => Err(StoreError::Corrupt(format!("unknown event type: {}", other))),
        }
    }
}

/// Append-only log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub task_id: String,
    pub event_type: EventType,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(task_id: impl Into<String>, event_type: EventType, payload: Value) -> Self {
        Self {
            id: new_id(),
            task_id: task_id.into(),
            event_type,
            payload,
            created_at: Utc::now(),
        }
    }
}
