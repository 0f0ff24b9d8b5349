use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use repowiki_models::{ModelPool, ProxyChatModel};
use repowiki_skills::{SkillMiddleware, SkillSource};
use repowiki_types::{
    AgentBlueprint, AgentBuilder, ChatBackend, RunnableAgent, Tool, ToolProvider, UsageSink,
};

use crate::config::CoordinatorConfig;
use crate::definition::AgentDefinition;
use crate::loader::DefinitionLoader;
use crate::registry::DefinitionRegistry;
use crate::watcher::{ChangeWatcher, FileEvent, FileEventKind};

/// Appended to every agent instruction so a stuck agent bails out with
/// partial results instead of burning its whole iteration budget
const RELIABILITY_DIRECTIVE: &str = "If a step fails repeatedly, summarize the progress made \
so far and finish; prefer returning partial results over retrying without progress.";

type AgentCache = RwLock<HashMap<String, Arc<dyn RunnableAgent>>>;

/// External collaborators the coordinator composes agents from
pub struct CoordinatorDeps {
    pub pool: Arc<ModelPool>,
    pub tool_provider: Arc<dyn ToolProvider>,
    pub builder: Arc<dyn AgentBuilder>,
    pub skill_source: Option<Arc<dyn SkillSource>>,
    pub usage_sink: Option<Arc<dyn UsageSink>>,
}

/// Top-level orchestrator over the definition registry and model routing.
///
/// Owns the registry, loader and watcher plus a cache of fully built
/// runnable agents. Watcher events flow into loader actions and cache
/// eviction; `get_agent` composes a definition with a failover-routing
/// chat backend, resolved tools and optional skill middleware, then hands
/// the blueprint to the external execution framework.
pub struct AgentCoordinator {
    config: CoordinatorConfig,
    registry: Arc<DefinitionRegistry>,
    loader: Arc<DefinitionLoader>,
    pool: Arc<ModelPool>,
    tool_provider: Arc<dyn ToolProvider>,
    builder: Arc<dyn AgentBuilder>,
    skill_middleware: Option<SkillMiddleware>,
    usage_sink: Option<Arc<dyn UsageSink>>,
    cache: Arc<AgentCache>,
    watcher: Mutex<Option<ChangeWatcher>>,
}

impl AgentCoordinator {
    /// Load every definition from the configured directory (a missing
    /// directory is not fatal), build the skill middleware once, and start
    /// watching for definition changes when enabled.
    pub fn init(config: CoordinatorConfig, deps: CoordinatorDeps) -> Result<Self> {
        let registry = Arc::new(DefinitionRegistry::new());
        let loader = Arc::new(DefinitionLoader::new(Arc::clone(&registry)));

        loader.load_from_dir(&config.agents_dir)?;

        let skill_middleware = match &deps.skill_source {
            Some(source) => SkillMiddleware::from_source(source.as_ref())?,
            None => None,
        };

        let coordinator = Self {
            registry,
            loader,
            pool: deps.pool,
            tool_provider: deps.tool_provider,
            builder: deps.builder,
            skill_middleware,
            usage_sink: deps.usage_sink,
            cache: Arc::new(RwLock::new(HashMap::new())),
            watcher: Mutex::new(None),
            config,
        };

        if coordinator.config.watch {
            coordinator.start_watcher();
        }
        Ok(coordinator)
    }

    fn start_watcher(&self) {
        let mut watcher = ChangeWatcher::new(
            &self.config.agents_dir,
            self.config.poll_interval,
            self.config.debounce,
        );
        let loader = Arc::clone(&self.loader);
        let cache = Arc::clone(&self.cache);
        watcher.start(Box::new(move |event| handle_event(&loader, &cache, event)));
        *self.watcher.lock() = Some(watcher);
    }

    /// Resolve a runnable agent by name, building and caching it on a miss.
    ///
    /// Concurrent misses for the same name may each build independently;
    /// the builds are idempotent and the cache write is last-write-wins.
    pub async fn get_agent(&self, name: &str) -> Result<Arc<dyn RunnableAgent>> {
        if let Some(agent) = self.cache.read().get(name) {
            return Ok(Arc::clone(agent));
        }

        let definition = self.registry.get(name)?;
        let agent = self.build_agent(&definition).await?;
        self.cache.write().insert(name.to_string(), Arc::clone(&agent));
        Ok(agent)
    }

    async fn build_agent(&self, definition: &AgentDefinition) -> Result<Arc<dyn RunnableAgent>> {
        tracing::info!(agent = %definition.name, tools = definition.tool_count(), "building agent");

        let mut proxy = ProxyChatModel::new(Arc::clone(&self.pool), definition.model_names());
        if let Some(sink) = &self.usage_sink {
            proxy = proxy.with_usage_sink(Arc::clone(sink));
        }
        let backend: Arc<dyn ChatBackend> = Arc::new(proxy);

        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(definition.tools.len() + 1);
        for tool_name in &definition.tools {
            match self.tool_provider.get_tool(tool_name) {
                Ok(tool) => tools.push(tool),
                Err(e) => {
                    tracing::warn!(agent = %definition.name, tool = %tool_name, error = %e, "skipping unresolvable tool");
                }
            }
        }

        let mut instruction = String::new();
        if let Some(middleware) = &self.skill_middleware {
            tools.push(middleware.skill_tool());
            instruction.push_str(&middleware.instruction_preamble());
            instruction.push_str("\n\n");
        }
        instruction.push_str(&definition.instruction);
        instruction.push_str("\n\n");
        instruction.push_str(RELIABILITY_DIRECTIVE);

        let blueprint = AgentBlueprint {
            name: definition.name.clone(),
            description: definition.description.clone(),
            instruction,
            backend,
            tools,
            max_iterations: definition.max_iterations,
            exit_enabled: definition.exit_enabled(),
        };

        self.builder.build(blueprint).await
    }

    /// Re-parse a definition from disk and drop any cached build of it
    pub fn reload(&self, name: &str) -> Result<Arc<AgentDefinition>> {
        let definition = self.loader.reload(name)?;
        self.cache.write().remove(name);
        Ok(definition)
    }

    /// All registered definitions, ordered by name
    pub fn list(&self) -> Vec<Arc<AgentDefinition>> {
        self.registry.list()
    }

    pub fn get_definition(&self, name: &str) -> Result<Arc<AgentDefinition>> {
        self.registry.get(name)
    }

    /// Stop the watcher and join its loop; idempotent
    pub fn shutdown(&self) {
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
    }
}

impl Drop for AgentCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply one watcher event to the registry and the built-agent cache
fn handle_event(loader: &DefinitionLoader, cache: &AgentCache, event: FileEvent) {
    match event.kind {
        FileEventKind::Create => match loader.load_from_path(&event.path) {
            Ok((definition, updated)) => {
                tracing::info!(agent = %definition.name, updated, "agent definition loaded from watcher");
            }
            Err(e) => {
                tracing::warn!(path = %event.path.display(), error = %e, "failed to load created definition");
            }
        },
        FileEventKind::Modify => {
            let Some(name) = agent_name_from_path(&event.path) else { return };
            match loader.reload(&name) {
                Ok(_) => tracing::info!(agent = %name, "agent definition reloaded"),
                Err(e) => {
                    tracing::warn!(agent = %name, error = %e, "failed to reload modified definition");
                }
            }
            cache.write().remove(&name);
        }
        FileEventKind::Delete => {
            let Some(name) = agent_name_from_path(&event.path) else { return };
            if let Err(e) = loader.unload(&name) {
                tracing::warn!(agent = %name, error = %e, "failed to unload deleted definition");
            } else {
                tracing::info!(agent = %name, "agent definition unloaded");
            }
            cache.write().remove(&name);
        }
    }
}

/// Definition files are named after their agent, so delete and modify
/// events resolve the agent name from the file stem
fn agent_name_from_path(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}
