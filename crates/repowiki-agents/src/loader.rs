use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::definition::AgentDefinition;
use crate::parser::DefinitionParser;
use crate::registry::DefinitionRegistry;

/// File extensions recognized as agent definitions
pub const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml"];

pub fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONFIG_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    Created,
    Updated,
    Failed,
}

/// Outcome of loading one definition file
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub definition: Option<Arc<AgentDefinition>>,
    pub action: LoadAction,
    pub error: Option<String>,
}

/// Batch and single-file definition loading on top of parser + registry
pub struct DefinitionLoader {
    parser: DefinitionParser,
    registry: Arc<DefinitionRegistry>,
}

impl DefinitionLoader {
    pub fn new(registry: Arc<DefinitionRegistry>) -> Self {
        Self { parser: DefinitionParser::new(), registry }
    }

    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }

    /// Load every recognized definition file in `dir`.
    ///
    /// A failure on one file is recorded in its result and never aborts the
    /// batch. A missing directory yields an empty result list.
    pub fn load_from_dir(&self, dir: &Path) -> Result<Vec<LoadResult>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(dir = %dir.display(), "agents directory does not exist, nothing to load");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read agents directory {}", dir.display()));
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_config_file(p))
            .collect();
        paths.sort();

        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_from_path(&path) {
                Ok((definition, updated)) => {
                    let action = if updated { LoadAction::Updated } else { LoadAction::Created };
                    results.push(LoadResult { path, definition: Some(definition), action, error: None });
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load agent definition");
                    results.push(LoadResult {
                        path,
                        definition: None,
                        action: LoadAction::Failed,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let failed = results.iter().filter(|r| r.action == LoadAction::Failed).count();
        tracing::info!(loaded = results.len() - failed, failed, dir = %dir.display(), "agent definitions loaded");
        Ok(results)
    }

    /// Parse and register one file, reporting whether an existing
    /// registration was replaced
    pub fn load_from_path(&self, path: &Path) -> Result<(Arc<AgentDefinition>, bool)> {
        let definition = self.parser.parse(path)?;
        let updated = self.registry.exists(&definition.name);
        Ok((self.registry.register(definition), updated))
    }

    /// Re-parse a loaded definition from its recorded source path and
    /// re-register it
    pub fn reload(&self, name: &str) -> Result<Arc<AgentDefinition>> {
        let existing = self.registry.get(name)?;
        let definition = self.parser.parse(&existing.source_path)?;
        Ok(self.registry.register(definition))
    }

    pub fn unload(&self, name: &str) -> Result<()> {
        self.registry.unregister(name)
    }
}
