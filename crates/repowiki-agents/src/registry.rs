use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use repowiki_types::AgentError;

use crate::definition::AgentDefinition;

/// Concurrent catalogue of agent definitions keyed by name.
///
/// One reader/writer lock guards the map; it is held only for the map
/// access itself. Registration is last-write-wins, so a racing reload and
/// read simply converge on the newest version.
#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: RwLock<HashMap<String, Arc<AgentDefinition>>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a definition; a duplicate name replaces the previous record
    /// wholesale
    pub fn register(&self, definition: AgentDefinition) -> Arc<AgentDefinition> {
        let definition = Arc::new(definition);
        let replaced = self
            .definitions
            .write()
            .insert(definition.name.clone(), Arc::clone(&definition))
            .is_some();
        tracing::debug!(agent = %definition.name, replaced, "registered agent definition");
        definition
    }

    pub fn unregister(&self, name: &str) -> Result<()> {
        match self.definitions.write().remove(name) {
            Some(_) => {
                tracing::debug!(agent = name, "unregistered agent definition");
                Ok(())
            }
            None => Err(AgentError::AgentNotFound(name.to_string()).into()),
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<AgentDefinition>> {
        self.definitions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::AgentNotFound(name.to_string()).into())
    }

    /// All definitions, ordered by name
    pub fn list(&self) -> Vec<Arc<AgentDefinition>> {
        let mut all: Vec<_> = self.definitions.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn exists(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn clear(&self) {
        self.definitions.write().clear();
    }
}
