//! Core types and contracts for repowiki
//!
//! This crate provides the foundational types used across all repowiki
//! crates: the chat-backend contract, tool contract, credential records
//! and the seams to the external credential store, usage sink and
//! agent-execution framework.

pub mod chat;
pub mod credential;
pub mod error;
pub mod runtime;
pub mod tool;

// Re-export commonly used types
pub use chat::{ChatBackend, ChatMessage, ChatResponse, MessageStream, StreamChunk, TokenUsage, ToolDefinition};
pub use credential::{CredentialStatus, CredentialStore, ModelCredential, UsageSink};
pub use error::{AgentError, ModelError};
pub use runtime::{AgentBlueprint, AgentBuilder, RunnableAgent};
pub use tool::{ParameterDefinition, Tool, ToolParameters, ToolProvider, ToolResult};
