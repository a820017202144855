//! SQLite-backed store shared by worker processes

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::model::{Event, Lock, QueueEntry, QueueStatus, QueueUpdate, Task, TaskStatus, TaskUpdate};
use crate::{EventStore, QueueStore, Result, StoreError, TaskStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
  id TEXT PRIMARY KEY,
  agent_type TEXT NOT NULL,
  user_id TEXT NOT NULL,
  instruction TEXT NOT NULL,
  context TEXT NOT NULL DEFAULT '{}',
  status TEXT NOT NULL,
  failure_code TEXT,
  retryable INTEGER NOT NULL DEFAULT 0,
  error_detail TEXT,
  result TEXT,
  approval_feedback TEXT,
  input_tokens INTEGER,
  output_tokens INTEGER,
  total_tokens INTEGER,
  duration_ms INTEGER,
  model_provider TEXT,
  model_name TEXT,
  created_at TEXT NOT NULL,
  started_at TEXT,
  completed_at TEXT,
  approved_at TEXT,
  rejected_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);

CREATE TABLE IF NOT EXISTS task_queue (
  id TEXT PRIMARY KEY,
  task_id TEXT,
  status TEXT NOT NULL DEFAULT 'queued',
  attempts INTEGER NOT NULL DEFAULT 0,
  max_attempts INTEGER NOT NULL DEFAULT 3,
  next_run_at TEXT NOT NULL,
  locked_by TEXT,
  locked_at TEXT,
  last_error TEXT,
  created_at TEXT NOT NULL,
  processed_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_queue_status ON task_queue(status, next_run_at);
CREATE INDEX IF NOT EXISTS idx_queue_task ON task_queue(task_id);

CREATE TABLE IF NOT EXISTS task_events (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  id TEXT NOT NULL UNIQUE,
  task_id TEXT NOT NULL,
  event_type TEXT NOT NULL,
  payload TEXT NOT NULL,
  created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_task ON task_events(task_id);
"#;

const TASK_COLUMNS: &str = "id, agent_type, user_id, instruction, context, status, failure_code, \
    retryable, error_detail, result, approval_feedback, input_tokens, output_tokens, total_tokens, \
    duration_ms, model_provider, model_name, created_at, started_at, completed_at, approved_at, \
    rejected_at";

const ENTRY_COLUMNS: &str = "id, task_id, status, attempts, max_attempts, next_run_at, locked_by, \
    locked_at, last_error, created_at, processed_at";

const EVENT_COLUMNS: &str = "id, task_id, event_type, payload, created_at";

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|at| at.with_timezone(&Utc))
}

fn conversion_err(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    parse_ts(&value).map_err(|e| conversion_err(idx, e))
}

fn get_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| parse_ts(&v).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let context: String = row.get(4)?;
    let status: String = row.get(5)?;
    let duration_ms: Option<i64> = row.get(14)?;

    Ok(Task {
        id: row.get(0)?,
        agent_type: row.get(1)?,
        user_id: row.get(2)?,
        instruction: row.get(3)?,
        context: serde_json::from_str(&context).map_err(|e| conversion_err(4, e))?,
        status: status
            .parse::<TaskStatus>()
            .map_err(|e| conversion_err(5, e))?,
        failure_code: row.get(6)?,
        retryable: row.get(7)?,
        error_detail: row.get(8)?,
        result: row.get(9)?,
        approval_feedback: row.get(10)?,
        input_tokens: row.get(11)?,
        output_tokens: row.get(12)?,
        total_tokens: row.get(13)?,
        duration_ms: duration_ms.map(|ms| ms.max(0) as u64),
        model_provider: row.get(15)?,
        model_name: row.get(16)?,
        created_at: get_ts(row, 17)?,
        started_at: get_opt_ts(row, 18)?,
        completed_at: get_opt_ts(row, 19)?,
        approved_at: get_opt_ts(row, 20)?,
        rejected_at: get_opt_ts(row, 21)?,
    })
}

/// A queue row plus what was actually stored in `locked_at`
struct LoadedEntry {
    entry: QueueEntry,
    raw_locked_at: Option<String>,
    lock_unreadable: bool,
}

/// A held lock whose timestamp cannot be read is mapped to the epoch,
/// which makes it stale.
fn row_to_entry(row: &Row) -> rusqlite::Result<LoadedEntry> {
    let status: String = row.get(2)?;
    let locked_by: Option<String> = row.get(6)?;
    let raw_locked_at: Option<String> = row.get(7)?;

    let mut lock_unreadable = false;
    let lock = locked_by.map(|holder| {
        let locked_at = match raw_locked_at.as_deref().map(parse_ts) {
            Some(Ok(at)) => at,
            _ => {
                lock_unreadable = true;
                DateTime::<Utc>::default()
            }
        };
        Lock { holder, locked_at }
    });

    let entry = QueueEntry {
        id: row.get(0)?,
        task_id: row.get(1)?,
        status: status
            .parse::<QueueStatus>()
            .map_err(|e| conversion_err(2, e))?,
        attempts: row.get(3)?,
        max_attempts: row.get(4)?,
        next_run_at: get_ts(row, 5)?,
        lock,
        last_error: row.get(8)?,
        created_at: get_ts(row, 9)?,
        processed_at: get_opt_ts(row, 10)?,
    };

    Ok(LoadedEntry {
        entry,
        raw_locked_at,
        lock_unreadable,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    let event_type: String = row.get(2)?;
    let payload: String = row.get(3)?;

    Ok(Event {
        id: row.get(0)?,
        task_id: row.get(1)?,
        event_type: event_type.parse().map_err(|e: StoreError| conversion_err(2, e))?,
        payload: serde_json::from_str(&payload).map_err(|e| conversion_err(3, e))?,
        created_at: get_ts(row, 4)?,
    })
}

type Fields = (Vec<&'static str>, Vec<Box<dyn ToSql + Send>>);

fn task_fields(update: &TaskUpdate) -> Fields {
    let mut fields = Vec::new();
    let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

    if let Some(status) = update.status {
        fields.push("status = ?");
        values.push(Box::new(status.as_str()));
    }
    if let Some(code) = &update.failure_code {
        fields.push("failure_code = ?");
        values.push(Box::new(code.clone()));
    }
    if let Some(retryable) = update.retryable {
        fields.push("retryable = ?");
        values.push(Box::new(retryable));
    }
    if let Some(detail) = &update.error_detail {
        fields.push("error_detail = ?");
        values.push(Box::new(detail.clone()));
    }
    if let Some(result) = &update.result {
        fields.push("result = ?");
        values.push(Box::new(result.clone()));
    }
    if let Some(feedback) = &update.approval_feedback {
        fields.push("approval_feedback = ?");
        values.push(Box::new(feedback.clone()));
    }
    if let Some(n) = update.input_tokens {
        fields.push("input_tokens = ?");
        values.push(Box::new(n));
    }
    if let Some(n) = update.output_tokens {
        fields.push("output_tokens = ?");
        values.push(Box::new(n));
    }
    if let Some(n) = update.total_tokens {
        fields.push("total_tokens = ?");
        values.push(Box::new(n));
    }
    if let Some(ms) = update.duration_ms {
        fields.push("duration_ms = ?");
        values.push(Box::new(ms as i64));
    }
    if let Some(provider) = &update.model_provider {
        fields.push("model_provider = ?");
        values.push(Box::new(provider.clone()));
    }
    if let Some(model) = &update.model_name {
        fields.push("model_name = ?");
        values.push(Box::new(model.clone()));
    }
    if let Some(at) = update.started_at {
        fields.push("started_at = ?");
        values.push(Box::new(at.map(ts)));
    }
    if let Some(at) = update.completed_at {
        fields.push("completed_at = ?");
        values.push(Box::new(at.map(ts)));
    }
    if let Some(at) = update.approved_at {
        fields.push("approved_at = ?");
        values.push(Box::new(ts(at)));
    }
    if let Some(at) = update.rejected_at {
        fields.push("rejected_at = ?");
        values.push(Box::new(ts(at)));
    }
    (fields, values)
}

/// `WHERE` clause matching tasks still open to updates
fn active_task_guard() -> String {
    let terminal: Vec<String> = TaskStatus::TERMINAL
        .iter()
        .map(|status| format!("'{}'", status.as_str()))
        .collect();
    format!("status NOT IN ({})", terminal.join(", "))
}

fn execute_dynamic(
    conn: &Connection,
    table: &str,
    id: &str,
    fields: Vec<&str>,
    mut values: Vec<Box<dyn ToSql + Send>>,
    guard: Option<&str>,
) -> rusqlite::Result<usize> {
    let condition = match guard {
        Some(guard) => format!("id = ? AND {}", guard),
        None => "id = ?".to_string(),
    };

    if fields.is_empty() {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", table, condition);
        return conn.query_row(&sql, params![id], |row| row.get::<_, i64>(0).map(|n| n as usize));
    }

    let sql = format!("UPDATE {} SET {} WHERE {}", table, fields.join(", "), condition);
    values.push(Box::new(id.to_string()));
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref() as &dyn ToSql).collect();
    conn.execute(&sql, params.as_slice())
}

/// Store over a single SQLite database file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` in WAL mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = ?path, journal_mode = %mode, "opened sqlite store");
        Self::init(conn)
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn insert_task(&self, task: &Task) -> Result<()> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "INSERT INTO tasks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, \
             ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            TASK_COLUMNS
        );
        conn.execute(
            &sql,
            params![
                task.id,
                task.agent_type,
                task.user_id,
                task.instruction,
                serde_json::to_string(&task.context)?,
                task.status.as_str(),
                task.failure_code,
                task.retryable,
                task.error_detail,
                task.result,
                task.approval_feedback,
                task.input_tokens,
                task.output_tokens,
                task.total_tokens,
                task.duration_ms.map(|ms| ms as i64),
                task.model_provider,
                task.model_name,
                ts(task.created_at),
                task.started_at.map(ts),
                task.completed_at.map(ts),
                task.approved_at.map(ts),
                task.rejected_at.map(ts),
            ],
        )?;
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = conn.query_row(&sql, params![id], row_to_task).optional()?;
        Ok(task)
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<()> {
        let (fields, values) = task_fields(update);
        let conn = self.conn.lock().await;
        let changed = execute_dynamic(&conn, "tasks", id, fields, values, None)?;
        if changed == 0 {
            return Err(StoreError::task_not_found(id));
        }
        Ok(())
    }

    async fn update_active_task(&self, id: &str, update: &TaskUpdate) -> Result<bool> {
        let (fields, values) = task_fields(update);
        let guard = active_task_guard();
        let conn = self.conn.lock().await;
        let changed = execute_dynamic(&conn, "tasks", id, fields, values, Some(&guard))?;
        if changed > 0 {
            return Ok(true);
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::task_not_found(id));
        }
        debug!(task_id = id, "task already terminal, update skipped");
        Ok(false)
    }

    async fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> Result<Vec<Task>> {
        let conn = self.conn.lock().await;
        let limit = limit as i64;

        let tasks = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM tasks WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2",
                    TASK_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![status.as_str(), limit], row_to_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM tasks ORDER BY created_at DESC LIMIT ?1",
                    TASK_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], row_to_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(tasks)
    }
}

#[async_trait]
impl QueueStore for SqliteStore {
    async fn insert_entry(&self, entry: &QueueEntry) -> Result<()> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "INSERT INTO task_queue ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            ENTRY_COLUMNS
        );
        conn.execute(
            &sql,
            params![
                entry.id,
                entry.task_id,
                entry.status.as_str(),
                entry.attempts,
                entry.max_attempts,
                ts(entry.next_run_at),
                entry.lock.as_ref().map(|l| l.holder.clone()),
                entry.lock.as_ref().map(|l| ts(l.locked_at)),
                entry.last_error,
                ts(entry.created_at),
                entry.processed_at.map(ts),
            ],
        )?;
        Ok(())
    }

    async fn get_entry(&self, id: &str) -> Result<Option<QueueEntry>> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {} FROM task_queue WHERE id = ?1", ENTRY_COLUMNS);
        let loaded = conn.query_row(&sql, params![id], row_to_entry).optional()?;
        Ok(loaded.map(|l| l.entry))
    }

    async fn entry_for_task(&self, task_id: &str) -> Result<Option<QueueEntry>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM task_queue WHERE task_id = ?1 ORDER BY created_at DESC LIMIT 1",
            ENTRY_COLUMNS
        );
        let loaded = conn.query_row(&sql, params![task_id], row_to_entry).optional()?;
        Ok(loaded.map(|l| l.entry))
    }

    async fn update_entry(&self, id: &str, update: &QueueUpdate) -> Result<()> {
        let mut fields = Vec::new();
        let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

        if let Some(status) = update.status {
            fields.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(attempts) = update.attempts {
            fields.push("attempts = ?");
            values.push(Box::new(attempts));
        }
        if let Some(at) = update.next_run_at {
            fields.push("next_run_at = ?");
            values.push(Box::new(ts(at)));
        }
        if let Some(lock) = &update.lock {
            fields.push("locked_by = ?");
            values.push(Box::new(lock.as_ref().map(|l| l.holder.clone())));
            fields.push("locked_at = ?");
            values.push(Box::new(lock.as_ref().map(|l| ts(l.locked_at))));
        }
        if let Some(error) = &update.last_error {
            fields.push("last_error = ?");
            values.push(Box::new(error.clone()));
        }
        if let Some(at) = update.processed_at {
            fields.push("processed_at = ?");
            values.push(Box::new(at.map(ts)));
        }

        let conn = self.conn.lock().await;
        let changed = execute_dynamic(&conn, "task_queue", id, fields, values, None)?;
        if changed == 0 {
            return Err(StoreError::entry_not_found(id));
        }
        Ok(())
    }

    async fn claimable_entries(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueueEntry>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM task_queue \
             WHERE (status = 'queued' AND next_run_at <= ?1) OR status = 'processing' \
             ORDER BY created_at ASC",
            ENTRY_COLUMNS
        );

        let loaded = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![ts(now)], row_to_entry)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut entries = Vec::new();
        for candidate in loaded {
            if !candidate.entry.is_claimable(now, stale_before) {
                continue;
            }

            // Rewrite an unreadable lock timestamp so the claim guard can match it
            if candidate.lock_unreadable {
                if let Some(lock) = &candidate.entry.lock {
                    warn!(
                        entry_id = %candidate.entry.id,
                        locked_at = ?candidate.raw_locked_at,
                        "unreadable lock timestamp, treating as stale"
                    );
                    conn.execute(
                        "UPDATE task_queue SET locked_at = ?1 WHERE id = ?2 AND locked_at IS ?3",
                        params![ts(lock.locked_at), candidate.entry.id, candidate.raw_locked_at],
                    )?;
                }
            }

            entries.push(candidate.entry);
            if entries.len() >= limit {
                break;
            }
        }

        Ok(entries)
    }

    async fn claim_entry(
        &self,
        id: &str,
        expected_status: QueueStatus,
        expected_lock: Option<&Lock>,
        new_lock: &Lock,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE task_queue SET status = 'processing', locked_by = ?1, locked_at = ?2 \
             WHERE id = ?3 AND status = ?4 AND locked_by IS ?5 AND locked_at IS ?6",
            params![
                new_lock.holder,
                ts(new_lock.locked_at),
                id,
                expected_status.as_str(),
                expected_lock.map(|l| l.holder.clone()),
                expected_lock.map(|l| ts(l.locked_at)),
            ],
        )?;
        debug!(entry_id = id, changed, "claim update issued");
        Ok(())
    }
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn append_event(&self, event: &Event) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO task_events (id, task_id, event_type, payload, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.task_id,
                event.event_type.as_str(),
                serde_json::to_string(&event.payload)?,
                ts(event.created_at),
            ],
        )?;
        Ok(())
    }

    async fn events_for_task(&self, task_id: &str) -> Result<Vec<Event>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM task_events WHERE task_id = ?1 ORDER BY seq ASC",
            EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![task_id], row_to_event)?;
        let events = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_ts_is_fixed_width_and_sortable() {
        let early = Utc::now();
        let late = early + ChronoDuration::milliseconds(1500);
        assert_eq!(ts(early).len(), ts(late).len());
        assert!(ts(early) < ts(late));
        assert!(ts(early).ends_with('Z'));
    }

    #[test]
    fn test_parse_ts_round_trip_at_micros() {
        let at = parse_ts("2024-05-01T12:00:00.123456Z").unwrap();
        assert_eq!(ts(at), "2024-05-01T12:00:00.123456Z");
        assert!(parse_ts("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_unreadable_lock_is_reclaimable() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Utc::now();
        let entry = QueueEntry::for_task("t1", 3, now);
        store.insert_entry(&entry).await.unwrap();

        {
            let conn = store.conn.lock().await;
            conn.execute(
                "UPDATE task_queue SET status = 'processing', locked_by = 'w-old', locked_at = 'garbage' WHERE id = ?1",
                params![entry.id],
            )
            .unwrap();
        }

        let stale_before = now - ChronoDuration::minutes(10);
        let claimable = store.claimable_entries(now, stale_before, 5).await.unwrap();
        assert_eq!(claimable.len(), 1);

        let observed = claimable[0].lock.clone();
        assert_eq!(observed.as_ref().map(|l| l.holder.as_str()), Some("w-old"));

        store
            .claim_entry(
                &entry.id,
                QueueStatus::Processing,
                observed.as_ref(),
                &Lock::new("w-new", now),
            )
            .await
            .unwrap();

        let reread = store.get_entry(&entry.id).await.unwrap().unwrap();
        assert!(reread.is_held_by("w-new"));
    }
}
