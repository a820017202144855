//! Model provider contract
//!
//! Request/response types for multi-turn tool-using conversations and the
//! `Provider` trait the conversation loop calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use thiserror::Error;
use tracing::{debug, trace};

pub mod anthropic;

pub use anthropic::AnthropicProvider;

/// Provider errors
///
/// Display strings keep the HTTP status and the provider name visible so
/// downstream failure classification can key on them.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("anthropic request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("anthropic response decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("anthropic API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("ANTHROPIC_API_KEY not configured")]
    NoApiKey,

    #[error("anthropic returned an invalid response")]
    InvalidResponse,

    #[error("429 rate limit exceeded")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }
}

/// Conversation history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(content)],
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(content)],
        }
    }

    pub fn assistant_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    pub fn tool_results(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }
}

/// Why the model ended its turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    Other(String),
}

impl StopReason {
    pub fn as_str(&self) -> &str {
        match self {
            StopReason::EndTurn => "end_turn",
            StopReason::ToolUse => "tool_use",
            StopReason::Other(reason) => reason,
        }
    }
}

impl From<String> for StopReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            _ => StopReason::Other(value),
        }
    }
}

impl From<StopReason> for String {
    fn from(value: StopReason) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token accounting for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A tool-use request extracted from a response
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Model response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub model: String,
}

impl ChatResponse {
    /// Final-turn response carrying only text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(content)],
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
            model: String::new(),
        }
    }

    /// Response asking for the given tool calls
    pub fn tool_use(calls: Vec<ToolCall>) -> Self {
        Self {
            content: calls
                .into_iter()
                .map(|c| ContentBlock::tool_use(c.id, c.name, c.input))
                .collect(),
            stop_reason: StopReason::ToolUse,
            usage: Usage::default(),
            model: String::new(),
        }
    }

    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.usage = Usage {
            input_tokens,
            output_tokens,
        };
        self
    }

    /// All text blocks, concatenated in order
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// Tool schema offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Request parameters
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            system: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// LLM provider
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    /// Provider identifier recorded on tasks
    fn name(&self) -> &str;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Parameter type in a tool input schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    StringArray,
}

/// Build a JSON object schema from `(name, kind, description, required)` tuples
pub fn object_schema(properties: &[(&str, ParamKind, &str, bool)]) -> Value {
    let mut props = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, kind, description, is_required) in properties {
        let prop = match kind {
            ParamKind::String => serde_json::json!({"type": "string", "description": description}),
            ParamKind::Integer => serde_json::json!({"type": "integer", "description": description}),
            ParamKind::Number => serde_json::json!({"type": "number", "description": description}),
            ParamKind::Boolean => serde_json::json!({"type": "boolean", "description": description}),
            ParamKind::StringArray => serde_json::json!({
                "type": "array",
                "items": {"type": "string"},
                "description": description
            }),
        };
        props.insert(name.to_string(), prop);
        if *is_required {
            required.push(name.to_string());
        }
    }

    trace!("built object schema with {} properties", props.len());

    let mut schema = serde_json::json!({
        "type": "object",
        "properties": props,
    });
    if !required.is_empty() {
        schema["required"] = serde_json::json!(required);
    }
    schema
}

/// Log a one-line summary of a response
pub(crate) fn log_response(response: &ChatResponse) {
    debug!(
        stop_reason = %response.stop_reason,
        tool_calls = response.tool_calls().len(),
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "model response"
    );
}
