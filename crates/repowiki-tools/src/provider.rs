use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use repowiki_types::{AgentError, Tool, ToolProvider};

use crate::file_ops::{ListDirTool, ReadFileTool, SearchFilesTool};
use crate::skills_tool::ListSkillsTool;

/// Tool provider over the fixed built-in tool set, sandboxed to a repository
/// checkout
pub struct WorkspaceToolProvider {
    pub base_path: PathBuf,
    pub skills_dir: PathBuf,
}

impl WorkspaceToolProvider {
    pub fn new(base_path: impl Into<PathBuf>, skills_dir: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into(), skills_dir: skills_dir.into() }
    }
}

impl ToolProvider for WorkspaceToolProvider {
    fn get_tool(&self, name: &str) -> Result<Arc<dyn Tool>> {
        match name {
            "list_dir" => Ok(Arc::new(ListDirTool::new(&self.base_path))),
            "read_file" => Ok(Arc::new(ReadFileTool::new(&self.base_path))),
            "search_files" => Ok(Arc::new(SearchFilesTool::new(&self.base_path))),
            "list_skills" => Ok(Arc::new(ListSkillsTool::new(&self.skills_dir))),
            _ => Err(AgentError::ToolNotFound(name.to_string()).into()),
        }
    }

    fn list_tools(&self) -> Vec<String> {
        ["list_dir", "read_file", "search_files", "list_skills"]
            .map(String::from)
            .to_vec()
    }
}

/// Map-backed tool provider for embedders and tests
#[derive(Default)]
pub struct SimpleToolProvider {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl SimpleToolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }
}

impl ToolProvider for SimpleToolProvider {
    fn get_tool(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()).into())
    }

    fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}
