//! AgentHub command implementations

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use agenthub_agent::schemas::tool_schemas;
use agenthub_agent::{AgentRuntime, AgentType, NoCapabilities};
use agenthub_config::{self, Config};
use agenthub_provider::anthropic::AnthropicProvider;
use agenthub_store::{
    cancel_task, review_task, submit_task, EventStore, NewTask, QueueStore, SqliteStore, Store,
    TaskStatus, TaskStore,
};
use agenthub_worker::TaskWorker;

/// Arguments of `submit`
pub struct SubmitArgs {
    pub agent: String,
    pub user: String,
    pub task: String,
    pub context: Option<String>,
    pub approval: bool,
    pub max_attempts: Option<u32>,
}

/// Arguments of `worker`
pub struct WorkerArgs {
    pub poll_interval_ms: Option<u64>,
    pub worker_id: Option<String>,
}

fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    let path = config.store_path();
    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn load() -> Result<(Config, Arc<dyn Store>)> {
    let config = Config::load().await.context("failed to load config")?;
    let store = open_store(&config)?;
    Ok((config, store))
}

fn parse_context(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("--context is not valid JSON")?;
    if !value.is_object() {
        bail!("--context must be a JSON object");
    }
    Ok(value)
}

/// Write the default config and create the store
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing AgentHub...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = agenthub_config::init().await?;
    open_store(&config)?;

    println!("Config: {}", agenthub_config::config_path().display());
    println!("Store:  {}", config.store_path().display());
    println!("\n◆ AgentHub initialized");
    println!("\nNext steps:");
    println!(
        "  1. Set {} or add your key to {}",
        agenthub_config::API_KEY_ENV,
        agenthub_config::config_path().display()
    );
    println!("  2. Submit a task: agenthub submit -a bookkeeper -t \"Categorize last week\"");
    println!("  3. Start a worker: agenthub worker");

    Ok(())
}

/// Print the agent catalog
pub async fn agents_command() -> Result<()> {
    println!("◆ Agents");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for agent in AgentType::ALL {
        let info = agent.info();
        println!(
            "  {:<20} {:<22} {:<20} {} tools",
            agent.as_str(),
            info.name,
            info.category,
            tool_schemas(agent).len()
        );
    }

    Ok(())
}

/// Create a task and, unless it needs approval, queue it
pub async fn submit_command(args: SubmitArgs) -> Result<()> {
    let agent: AgentType = args.agent.parse()?;
    let context = parse_context(args.context.as_deref())?;
    let (config, store) = load().await?;

    let new_task = NewTask::new(agent.as_str(), args.user, args.task)
        .with_context(context)
        .with_max_attempts(args.max_attempts.unwrap_or(config.worker.max_attempts));

    let task = submit_task(store.as_ref(), new_task, args.approval).await?;

    println!("✓ Task submitted: {}", task.id);
    println!("  Agent:  {}", agent.display_name());
    println!("  Status: {}", task.status);

    Ok(())
}

/// Approve or reject a task
pub async fn approve_command(id: String, approved: bool, feedback: Option<String>) -> Result<()> {
    let (_, store) = load().await?;
    let task = review_task(store.as_ref(), &id, approved, feedback).await?;

    if approved {
        println!("✓ Task {} approved ({})", task.id, task.status);
    } else {
        println!("✓ Task {} rejected", task.id);
    }

    Ok(())
}

/// Cancel a task
pub async fn cancel_command(id: String) -> Result<()> {
    let (_, store) = load().await?;
    let task = cancel_task(store.as_ref(), &id).await?;

    println!("✓ Task {} cancelled", task.id);
    Ok(())
}

/// Show one task with its queue entry and event log
pub async fn status_command(id: String) -> Result<()> {
    let (_, store) = load().await?;
    let Some(task) = store.get_task(&id).await? else {
        bail!("task not found: {}", id);
    };

    println!("◆ Task {}", task.id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Agent:    {}", task.agent_type);
    println!("User:     {}", task.user_id);
    println!("Status:   {}", task.status);
    println!("Task:     {}", task.instruction);
    println!("Created:  {}", task.created_at.to_rfc3339());
    if let Some(at) = task.started_at {
        println!("Started:  {}", at.to_rfc3339());
    }
    if let Some(at) = task.completed_at {
        println!("Finished: {}", at.to_rfc3339());
    }
    if let Some(code) = &task.failure_code {
        println!(
            "Failure:  {} (retryable: {})",
            code,
            if task.retryable { "yes" } else { "no" }
        );
    }
    if let Some(detail) = &task.error_detail {
        println!("Error:    {}", detail);
    }
    if let Some(total) = task.total_tokens {
        println!(
            "Tokens:   {} ({} in / {} out)",
            total,
            task.input_tokens.unwrap_or(0),
            task.output_tokens.unwrap_or(0)
        );
    }
    if let (Some(provider), Some(model)) = (&task.model_provider, &task.model_name) {
        println!("Model:    {}/{}", provider, model);
    }
    if let Some(ms) = task.duration_ms {
        println!("Duration: {} ms", ms);
    }
    if let Some(result) = &task.result {
        println!("\nResult:\n{}", result);
    }

    if let Some(entry) = store.entry_for_task(&task.id).await? {
        println!("\nQueue:");
        println!("  Entry:    {}", entry.id);
        println!("  Status:   {}", entry.status);
        println!("  Attempts: {}/{}", entry.attempts, entry.max_attempts);
        println!("  Next run: {}", entry.next_run_at.to_rfc3339());
        if let Some(lock) = &entry.lock {
            println!("  Locked:   {} at {}", lock.holder, lock.locked_at.to_rfc3339());
        }
        if let Some(err) = &entry.last_error {
            println!("  Last err: {}", err);
        }
    }

    let events = store.events_for_task(&task.id).await?;
    if !events.is_empty() {
        println!("\nEvents:");
        for event in events {
            println!(
                "  {} {:<22} {}",
                event.created_at.format("%H:%M:%S%.3f"),
                event.event_type,
                event.payload
            );
        }
    }

    Ok(())
}

/// List recent tasks, newest first
pub async fn list_command(status: Option<String>, limit: usize) -> Result<()> {
    let status = status
        .map(|s| s.parse::<TaskStatus>())
        .transpose()
        .context("unknown task status")?;
    let (_, store) = load().await?;
    let tasks = store.list_tasks(status, limit).await?;

    if tasks.is_empty() {
        println!("No tasks");
        return Ok(());
    }

    for task in tasks {
        println!(
            "  {}  {:<18} {:<18} {}",
            task.id, task.status, task.agent_type, task.instruction
        );
    }

    Ok(())
}

/// Run a worker until Ctrl+C
pub async fn worker_command(args: WorkerArgs) -> Result<()> {
    let mut config = Config::load().await.context("failed to load config")?;
    if let Some(ms) = args.poll_interval_ms {
        config.worker.poll_interval_ms = ms;
    }
    if args.worker_id.is_some() {
        config.worker.worker_id = args.worker_id;
    }
    config.validate_worker_ready()?;

    let api_key = config.api_key().context("No API key configured")?;
    let provider = AnthropicProvider::new(
        api_key,
        Some(config.api_base()),
        Some(config.runtime.model.clone()),
    )
    .with_timeout(Duration::from_secs(config.runtime.request_timeout_secs))?;

    let store = open_store(&config)?;
    let runtime = AgentRuntime::from_config(
        Arc::new(provider),
        store.clone(),
        Arc::new(NoCapabilities),
        &config.runtime,
    );
    let worker = TaskWorker::from_config(store, Arc::new(runtime), &config.worker);

    println!("◆ Worker {} started", worker.worker_id());
    println!("Store: {}", config.store_path().display());
    println!("Press Ctrl+C to stop");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.cancel();
            }
        }
    });

    worker.run(shutdown).await;
    println!("◆ Worker stopped");

    Ok(())
}
