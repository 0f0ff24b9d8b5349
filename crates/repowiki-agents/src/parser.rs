use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use repowiki_types::AgentError;

use crate::definition::AgentDefinition;

pub const MAX_NAME_CHARS: usize = 64;
pub const MAX_DESCRIPTION_CHARS: usize = 1024;
pub const MAX_INSTRUCTION_BYTES: usize = 100 * 1024;
pub const MIN_ITERATIONS: u32 = 1;
pub const MAX_ITERATIONS: u32 = 100;

/// Agent names are file-stem-safe identifiers: alphanumerics, underscore
/// and hyphen, with no leading, trailing or doubled hyphen.
pub fn is_valid_agent_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_CHARS {
        return false;
    }
    if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        return false;
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parses one definition file and enforces the definition invariants
#[derive(Debug, Default)]
pub struct DefinitionParser;

impl DefinitionParser {
    pub fn new() -> Self {
        Self
    }

    /// Read, decode and validate a definition file, stamping its source
    /// path and load time
    pub fn parse(&self, path: &Path) -> Result<AgentDefinition> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AgentError::ConfigNotFound(path.to_path_buf()).into());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("failed to read {}", path.display())));
            }
        };

        let mut definition: AgentDefinition = serde_yaml::from_str(&raw)
            .map_err(|e| AgentError::InvalidConfig(format!("{}: {e}", path.display())))?;
        definition.source_path = path.to_path_buf();
        definition.loaded_at = Utc::now();

        self.validate(&definition)?;
        Ok(definition)
    }

    pub fn validate(&self, definition: &AgentDefinition) -> Result<()> {
        if !is_valid_agent_name(&definition.name) {
            return Err(AgentError::InvalidName(definition.name.clone()).into());
        }
        if definition.description.is_empty() {
            return Err(AgentError::InvalidConfig("description must not be empty".into()).into());
        }
        if definition.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AgentError::InvalidConfig(format!(
                "description exceeds {MAX_DESCRIPTION_CHARS} characters"
            ))
            .into());
        }
        if definition.instruction.is_empty() {
            return Err(AgentError::InvalidConfig("instruction must not be empty".into()).into());
        }
        if definition.instruction.len() > MAX_INSTRUCTION_BYTES {
            return Err(AgentError::InvalidConfig(format!(
                "instruction exceeds {MAX_INSTRUCTION_BYTES} bytes"
            ))
            .into());
        }
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&definition.max_iterations) {
            return Err(AgentError::InvalidConfig(format!(
                "maxIterations must be between {MIN_ITERATIONS} and {MAX_ITERATIONS}, got {}",
                definition.max_iterations
            ))
            .into());
        }
        Ok(())
    }
}
