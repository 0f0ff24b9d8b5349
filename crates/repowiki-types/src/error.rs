use std::path::PathBuf;

use thiserror::Error;

/// Errors from definition parsing, registration and agent lookup
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("invalid agent config: {0}")]
    InvalidConfig(String),
    #[error("invalid agent name: {0}")]
    InvalidName(String),
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("tool not found: {0}")]
    ToolNotFound(String),
}

/// Errors from credential resolution and model routing
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("api key not found: {0}")]
    ApiKeyNotFound(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("no available model")]
    NoAvailableModel,
    #[error("all models unavailable")]
    AllModelsUnavailable,
    #[error("max retries exceeded")]
    MaxRetriesExceeded,
}
