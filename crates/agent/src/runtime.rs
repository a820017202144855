//! Conversation loop - runs one task against the model

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use agenthub_config::RuntimeConfig;
use agenthub_provider::{ChatParams, Provider, StopReason};
use agenthub_store::{Event, EventStore, EventType, Store, TaskStatus, TaskStore, TaskUpdate};

use crate::context::ContextBuilder;
use crate::registry::AgentType;
use crate::schemas;
use crate::tools::{CapabilityFactory, ToolDispatcher};
use crate::Result;

/// Longest tool result kept in a `tool_result` event
const RESULT_PREVIEW_CHARS: usize = 500;

/// One unit of work for the runtime
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub agent_type: AgentType,
    pub user_id: String,
    pub instruction: String,
    pub context: Value,
    /// Enables events, cancellation checks and run metadata
    pub task_id: Option<String>,
}

impl TaskRequest {
    pub fn new(
        agent_type: AgentType,
        user_id: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            agent_type,
            user_id: user_id.into(),
            instruction: instruction.into(),
            context: Value::Object(Default::default()),
            task_id: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed { result: String, iterations: u32 },
    Cancelled { iterations: u32 },
    MaxIterations { iterations: u32 },
    Stopped { stop_reason: String, iterations: u32 },
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Failure reason, `None` on success
    pub fn error(&self) -> Option<String> {
        match self {
            RunOutcome::Completed { .. } => None,
            RunOutcome::Cancelled { .. } => Some("Task cancelled".to_string()),
            RunOutcome::MaxIterations { .. } => Some("Max iterations reached".to_string()),
            RunOutcome::Stopped { stop_reason, .. } => {
                Some(format!("Model stopped: {}", stop_reason))
            }
        }
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn iterations(&self) -> u32 {
        match self {
            RunOutcome::Completed { iterations, .. }
            | RunOutcome::Cancelled { iterations }
            | RunOutcome::MaxIterations { iterations }
            | RunOutcome::Stopped { iterations, .. } => *iterations,
        }
    }
}

/// Something that can run a task to an outcome
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, request: TaskRequest) -> Result<RunOutcome>;
}

/// Bounded multi-turn conversation loop
pub struct AgentRuntime {
    provider: Arc<dyn Provider>,
    store: Arc<dyn Store>,
    capabilities: Arc<dyn CapabilityFactory>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_iterations: u32,
}

impl AgentRuntime {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn Store>,
        capabilities: Arc<dyn CapabilityFactory>,
    ) -> Self {
        Self::from_config(provider, store, capabilities, &RuntimeConfig::default())
    }

    pub fn from_config(
        provider: Arc<dyn Provider>,
        store: Arc<dyn Store>,
        capabilities: Arc<dyn CapabilityFactory>,
        config: &RuntimeConfig,
    ) -> Self {
        Self {
            provider,
            store,
            capabilities,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_iterations: config.max_iterations,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    async fn emit(&self, task_id: Option<&str>, event_type: EventType, payload: Value) {
        let Some(task_id) = task_id else {
            return;
        };
        let event = Event::new(task_id, event_type, payload);
        if let Err(e) = self.store.append_event(&event).await {
            warn!(task_id, event = %event_type, error = %e, "failed to append event");
        }
    }

    async fn is_cancelled(&self, task_id: Option<&str>) -> Result<bool> {
        let Some(task_id) = task_id else {
            return Ok(false);
        };
        let task = self.store.get_task(task_id).await?;
        Ok(matches!(task, Some(t) if t.status == TaskStatus::Cancelled))
    }

    async fn run(&self, request: TaskRequest) -> Result<RunOutcome> {
        let start = Instant::now();
        let agent = request.agent_type;
        let task_id = request.task_id.as_deref();

        let context = ContextBuilder::new(agent);
        let system = context.build_system_prompt();
        let tools = schemas::provider_tools(agent);
        let dispatcher =
            ToolDispatcher::for_user(self.capabilities.as_ref(), agent, &request.user_id);
        let mut messages = context.build_messages(&request.instruction, &request.context);

        let mut input_tokens: u32 = 0;
        let mut output_tokens: u32 = 0;

        info!(task_id, agent = %agent, "run started");
        self.emit(
            task_id,
            EventType::TaskStarted,
            json!({ "agent_type": agent.as_str() }),
        )
        .await;

        let mut iteration = 0;
        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                break;
            }

            if self.is_cancelled(task_id).await? {
                info!(task_id, iteration, "task cancelled, stopping run");
                return Ok(RunOutcome::Cancelled {
                    iterations: iteration - 1,
                });
            }

            debug!(task_id, iteration, "model call");
            self.emit(
                task_id,
                EventType::ModelCallStarted,
                json!({ "iteration": iteration }),
            )
            .await;

            let params = ChatParams {
                model: self.model.clone(),
                system: system.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };
            let response = self.provider.chat(params).await?;

            input_tokens = input_tokens.saturating_add(response.usage.input_tokens);
            output_tokens = output_tokens.saturating_add(response.usage.output_tokens);

            self.emit(
                task_id,
                EventType::ModelCallCompleted,
                json!({
                    "iteration": iteration,
                    "stop_reason": response.stop_reason.as_str(),
                    "input_tokens": response.usage.input_tokens,
                    "output_tokens": response.usage.output_tokens,
                    "total_tokens": response.usage.total_tokens(),
                }),
            )
            .await;

            match &response.stop_reason {
                StopReason::EndTurn => {
                    let result = response.joined_text();
                    let duration_ms = start.elapsed().as_millis() as u64;

                    if let Some(id) = task_id {
                        let update = TaskUpdate::new()
                            .run_metadata(duration_ms, self.provider.name(), self.model.clone())
                            .usage(input_tokens, output_tokens);
                        if let Err(e) = self.store.update_task(id, &update).await {
                            warn!(task_id = id, error = %e, "failed to record run metadata");
                        }
                    }

                    self.emit(
                        task_id,
                        EventType::TaskCompleted,
                        json!({ "iterations": iteration, "duration_ms": duration_ms }),
                    )
                    .await;
                    info!(task_id, iterations = iteration, duration_ms, "run completed");

                    return Ok(RunOutcome::Completed {
                        result,
                        iterations: iteration,
                    });
                }
                StopReason::ToolUse => {
                    let calls = response.tool_calls();
                    ContextBuilder::add_assistant_message(&mut messages, response.content.clone());

                    let mut results = Vec::with_capacity(calls.len());
                    for call in calls {
                        self.emit(
                            task_id,
                            EventType::ToolCalled,
                            json!({
                                "tool_name": call.name,
                                "input": call.input,
                                "iteration": iteration,
                            }),
                        )
                        .await;

                        let output = dispatcher.execute(agent, &call.name, call.input).await;
                        let content = render_tool_output(&output);

                        self.emit(
                            task_id,
                            EventType::ToolResult,
                            json!({
                                "tool_name": call.name,
                                "result_preview": preview(&content),
                            }),
                        )
                        .await;

                        results.push((call.id, content));
                    }

                    if !results.is_empty() {
                        ContextBuilder::add_tool_results(&mut messages, results);
                    }
                }
                StopReason::Other(reason) => {
                    // Its own outcome, not iteration exhaustion; the worker
                    // classifies both as UNKNOWN, so retries are unaffected.
                    let duration_ms = start.elapsed().as_millis() as u64;
                    warn!(task_id, stop_reason = %reason, "model stopped unexpectedly");
                    self.emit(
                        task_id,
                        EventType::TaskFailed,
                        json!({ "reason": reason, "duration_ms": duration_ms }),
                    )
                    .await;

                    return Ok(RunOutcome::Stopped {
                        stop_reason: reason.clone(),
                        iterations: iteration,
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        warn!(task_id, max_iterations = self.max_iterations, "max iterations reached");
        self.emit(
            task_id,
            EventType::TaskFailed,
            json!({ "reason": "max_iterations", "duration_ms": duration_ms }),
        )
        .await;

        Ok(RunOutcome::MaxIterations {
            iterations: self.max_iterations,
        })
    }
}

#[async_trait]
impl TaskExecutor for AgentRuntime {
    async fn execute(&self, request: TaskRequest) -> Result<RunOutcome> {
        self.run(request).await
    }
}

fn render_tool_output(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn preview(content: &str) -> String {
    content.chars().take(RESULT_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_errors() {
        assert_eq!(
            RunOutcome::Cancelled { iterations: 0 }.error().as_deref(),
            Some("Task cancelled")
        );
        assert_eq!(
            RunOutcome::MaxIterations { iterations: 10 }.error().as_deref(),
            Some("Max iterations reached")
        );
        let done = RunOutcome::Completed {
            result: "ok".to_string(),
            iterations: 1,
        };
        assert!(done.success());
        assert!(done.error().is_none());
        assert_eq!(done.result(), Some("ok"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(600);
        assert_eq!(preview(&long).chars().count(), 500);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_render_tool_output() {
        assert_eq!(render_tool_output(&json!("plain")), "plain");
        assert_eq!(render_tool_output(&json!({"a": 1})), "{\"a\":1}");
    }
}
