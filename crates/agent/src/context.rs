//! Conversation builder for a task run

use chrono::Utc;
use serde_json::Value;

use agenthub_provider::{ContentBlock, Message};

use crate::prompts;
use crate::registry::AgentType;

/// Builds the system prompt and conversation for one agent
pub struct ContextBuilder {
    agent: AgentType,
}

impl ContextBuilder {
    pub fn new(agent: AgentType) -> Self {
        Self { agent }
    }

    /// Build the system prompt, stamped with the current time
    pub fn build_system_prompt(&self) -> String {
        prompts::build_system_prompt(self.agent, Utc::now())
    }

    /// Build the opening conversation: a single user message
    pub fn build_messages(&self, instruction: &str, context: &Value) -> Vec<Message> {
        vec![Message::user(Self::seed_message(instruction, context))]
    }

    /// Instruction text, with the context appended when there is any
    pub fn seed_message(instruction: &str, context: &Value) -> String {
        if is_empty_context(context) {
            return instruction.to_string();
        }
        format!("{}\n\nAdditional context:\n{}", instruction, context)
    }

    /// Add the assistant turn exactly as the model produced it
    pub fn add_assistant_message(messages: &mut Vec<Message>, content: Vec<ContentBlock>) {
        messages.push(Message::assistant_blocks(content));
    }

    /// Add one user message carrying every tool result of a turn
    pub fn add_tool_results(messages: &mut Vec<Message>, results: Vec<(String, String)>) {
        let blocks = results
            .into_iter()
            .map(|(tool_use_id, content)| ContentBlock::tool_result(tool_use_id, content))
            .collect();
        messages.push(Message::tool_results(blocks));
    }
}

fn is_empty_context(context: &Value) -> bool {
    match context {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
