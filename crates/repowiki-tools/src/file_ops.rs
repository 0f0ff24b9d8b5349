use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use repowiki_types::{param, ParameterDefinition, Tool, ToolParameters, ToolResult};

const MAX_READ_BYTES: u64 = 1024 * 1024; // 1 MiB
const MAX_SEARCH_RESULTS: usize = 200;

/// Resolve `relative` under `base`, rejecting escapes from the sandbox
fn resolve_in_base(base: &Path, relative: &str) -> Result<PathBuf> {
    let joined = base.join(relative.trim_start_matches('/'));
    let canonical = joined
        .canonicalize()
        .with_context(|| format!("path not found: {}", relative))?;
    let base_canonical = base
        .canonicalize()
        .with_context(|| format!("invalid base path: {}", base.display()))?;
    if !canonical.starts_with(&base_canonical) {
        tracing::warn!(path = relative, "rejected path outside the workspace");
        anyhow::bail!("path escapes the workspace: {}", relative);
    }
    Ok(canonical)
}

/// List the entries of a directory inside the workspace
pub struct ListDirTool {
    base_path: PathBuf,
}

impl ListDirTool {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories at a path relative to the repository root"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("path", "string", "Directory path relative to the repository root", optional, ".")])
    }

    async fn execute(&self, params: ToolParameters) -> ToolResult {
        let rel: String = params.get_optional("path").unwrap_or_default().unwrap_or_else(|| ".".to_string());

        let dir = match resolve_in_base(&self.base_path, &rel) {
            Ok(dir) => dir,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => return ToolResult::error(format!("failed to list {}: {}", rel, e)),
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| {
                let mut name = e.file_name().to_string_lossy().into_owned();
                if e.path().is_dir() {
                    name.push('/');
                }
                name
            })
            .collect();
        names.sort();

        ToolResult::success(names.join("\n"))
    }
}

/// Read a file inside the workspace
pub struct ReadFileTool {
    base_path: PathBuf,
}

impl ReadFileTool {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file relative to the repository root"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("path", "string", "File path relative to the repository root", required)])
    }

    async fn execute(&self, params: ToolParameters) -> ToolResult {
        let rel: String = match params.get_required("path") {
            Ok(rel) => rel,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let file = match resolve_in_base(&self.base_path, &rel) {
            Ok(file) => file,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match fs::metadata(&file) {
            Ok(meta) if meta.len() > MAX_READ_BYTES => {
                return ToolResult::error(format!("file too large: {} bytes", meta.len()));
            }
            Err(e) => return ToolResult::error(format!("failed to stat {}: {}", rel, e)),
            _ => {}
        }

        match fs::read_to_string(&file) {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::error(format!("failed to read {}: {}", rel, e)),
        }
    }
}

/// Search file names in the workspace against a glob pattern
pub struct SearchFilesTool {
    base_path: PathBuf,
}

impl SearchFilesTool {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn walk(&self, dir: &Path, pattern: &glob::Pattern, hits: &mut Vec<String>) {
        if hits.len() >= MAX_SEARCH_RESULTS {
            return;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();

        for path in paths {
            if hits.len() >= MAX_SEARCH_RESULTS {
                return;
            }
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if path.is_dir() {
                if name == ".git" || name == "target" || name == "node_modules" {
                    continue;
                }
                self.walk(&path, pattern, hits);
            } else if pattern.matches(&name) {
                if let Ok(rel) = path.strip_prefix(&self.base_path) {
                    hits.push(rel.to_string_lossy().into_owned());
                }
            }
        }
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Find files whose name matches a glob pattern, searching the repository recursively"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("pattern", "string", "Glob pattern matched against file names, e.g. *.go", required)])
    }

    async fn execute(&self, params: ToolParameters) -> ToolResult {
        let raw: String = match params.get_required("pattern") {
            Ok(raw) => raw,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let pattern = match glob::Pattern::new(&raw) {
            Ok(pattern) => pattern,
            Err(e) => return ToolResult::error(format!("invalid pattern '{}': {}", raw, e)),
        };

        let mut hits = Vec::new();
        self.walk(&self.base_path, &pattern, &mut hits);

        if hits.is_empty() {
            ToolResult::success(format!("no files matching '{}'", raw))
        } else {
            ToolResult::success(hits.join("\n"))
        }
    }
}
