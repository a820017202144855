//! Tool dispatch
//!
//! Each agent owns a closed set of tool names (its schema table) and at
//! most one bound [`Capability`] that implements them for the owning user.
//! [`ToolDispatcher::execute`] never fails: every problem comes back as an
//! `{"error": ...}` object the model can read.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::registry::AgentType;
use crate::schemas;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Tool implementation bound to one agent and user
#[async_trait]
pub trait Capability: Send + Sync {
    async fn call(&self, tool: &str, args: Value) -> Result<Value, BoxError>;
}

/// Builds the capability for an agent on behalf of a user
pub trait CapabilityFactory: Send + Sync {
    fn build(&self, agent: AgentType, user_id: &str) -> Option<Arc<dyn Capability>>;
}

/// Factory used when no integrations are wired
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapabilities;

impl CapabilityFactory for NoCapabilities {
    fn build(&self, _agent: AgentType, _user_id: &str) -> Option<Arc<dyn Capability>> {
        None
    }
}

/// Routes tool calls to the agent's capability
#[derive(Default)]
pub struct ToolDispatcher {
    capabilities: HashMap<AgentType, Arc<dyn Capability>>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Dispatcher holding whatever the factory builds for this agent and user
    pub fn for_user(factory: &dyn CapabilityFactory, agent: AgentType, user_id: &str) -> Self {
        let mut dispatcher = Self::new();
        if let Some(capability) = factory.build(agent, user_id) {
            dispatcher.register(agent, capability);
        }
        dispatcher
    }

    pub fn register(&mut self, agent: AgentType, capability: Arc<dyn Capability>) {
        self.capabilities.insert(agent, capability);
    }

    pub fn has_capability(&self, agent: AgentType) -> bool {
        self.capabilities.contains_key(&agent)
    }

    pub async fn execute(&self, agent: AgentType, tool: &str, args: Value) -> Value {
        let Some(capability) = self.capabilities.get(&agent) else {
            return error_value(format!("{} tools not initialized", agent.display_name()));
        };

        if !schemas::has_tool(agent, tool) {
            return error_value(format!("Unknown tool: {}", tool));
        }

        let args = match args {
            Value::Object(map) => Value::Object(map),
            _ => Value::Object(Map::new()),
        };

        debug!(agent = %agent, tool, "dispatching tool call");
        match capability.call(tool, args).await {
            Ok(value) => value,
            Err(e) => {
                warn!(agent = %agent, tool, error = %e, "tool call failed");
                error_value(e.to_string())
            }
        }
    }
}

fn error_value(message: String) -> Value {
    json!({ "error": message })
}
