use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::chat::{ChatBackend, ChatMessage};
use crate::tool::Tool;

/// Fully composed configuration for one runnable agent.
///
/// Produced by the coordinator from an agent definition plus the resolved
/// backend, tools and middleware, then handed to the external execution
/// framework to materialize.
pub struct AgentBlueprint {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub backend: Arc<dyn ChatBackend>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub max_iterations: u32,
    /// Expose an explicit exit capability to the agent
    pub exit_enabled: bool,
}

impl std::fmt::Debug for AgentBlueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBlueprint")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .field("tools", &self.tools.iter().map(|t| t.name().to_string()).collect::<Vec<_>>())
            .field("max_iterations", &self.max_iterations)
            .field("exit_enabled", &self.exit_enabled)
            .finish()
    }
}

/// A materialized, executable agent
#[async_trait]
pub trait RunnableAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Drive the agent's step loop to completion, returning the last content
    async fn run(&self, messages: Vec<ChatMessage>) -> Result<String>;
}

/// External agent-execution framework seam: turns a blueprint into a
/// runnable, tool-calling agent.
#[async_trait]
pub trait AgentBuilder: Send + Sync {
    async fn build(&self, blueprint: AgentBlueprint) -> Result<Arc<dyn RunnableAgent>>;
}
