//! Agent core
//!
//! The agent catalog, per-agent prompts and tool schemas, the tool
//! dispatcher and the bounded conversation loop that runs one task.

use thiserror::Error;

pub mod context;
pub mod prompts;
pub mod registry;
pub mod runtime;
pub mod schemas;
pub mod tools;

pub use context::ContextBuilder;
pub use registry::{AgentInfo, AgentType};
pub use runtime::{AgentRuntime, RunOutcome, TaskExecutor, TaskRequest};
pub use tools::{Capability, CapabilityFactory, NoCapabilities, ToolDispatcher};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Unknown agent type: {0}")]
    UnknownAgent(String),

    #[error(transparent)]
    Provider(#[from] agenthub_provider::ProviderError),

    #[error(transparent)]
    Store(#[from] agenthub_store::StoreError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
