//! Hot-reloadable agent definition registry and coordination
//!
//! Agent definitions live one-per-file in a watched directory.
//! [`DefinitionParser`] validates a file into an [`AgentDefinition`],
//! [`DefinitionRegistry`] keeps the live catalogue, [`DefinitionLoader`]
//! composes the two for batch and single-file loads, and [`ChangeWatcher`]
//! feeds filesystem changes back into them. [`AgentCoordinator`] sits on
//! top: it resolves a definition into a runnable, tool-equipped agent with
//! a failover-capable chat backend and caches the result.

pub mod config;
pub mod definition;
pub mod loader;
pub mod manager;
pub mod parser;
pub mod registry;
pub mod watcher;

pub use config::{CoordinatorConfig, AGENTS_DIR_ENV};
pub use definition::{AgentDefinition, ExitConfig};
pub use loader::{DefinitionLoader, LoadAction, LoadResult};
pub use manager::{AgentCoordinator, CoordinatorDeps};
pub use parser::{is_valid_agent_name, DefinitionParser};
pub use registry::DefinitionRegistry;
pub use watcher::{ChangeWatcher, FileEvent, FileEventKind};
