use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declarative agent record decoded from one YAML definition file.
///
/// Replaced wholesale on reload, never merged; the registry hands out
/// shared references so readers always see one consistent version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    /// Single backend credential name
    #[serde(default)]
    pub model: String,
    /// Ordered credential pool; overrides `model` when non-empty
    #[serde(default)]
    pub models: Vec<String>,
    pub instruction: String,
    /// Tool identifiers resolved through the external tool provider
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(rename = "maxIterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub exit: Option<ExitConfig>,
    #[serde(skip)]
    pub source_path: PathBuf,
    #[serde(skip, default = "Utc::now")]
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(rename = "type", default)]
    pub exit_type: String,
}

impl AgentDefinition {
    /// Backend pool used for routing: `models` when present, else the
    /// single `model`, else empty (routes to the process default)
    pub fn model_names(&self) -> Vec<String> {
        if !self.models.is_empty() {
            self.models.clone()
        } else if !self.model.is_empty() {
            vec![self.model.clone()]
        } else {
            Vec::new()
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// The exit capability is enabled only by a non-empty exit type
    pub fn exit_enabled(&self) -> bool {
        self.exit.as_ref().is_some_and(|e| !e.exit_type.is_empty())
    }
}
