//! Built-in tools for repowiki agents
//!
//! These are the repository-inspection tools agent definitions can declare by
//! name: directory listing, file reading and filename search, all sandboxed
//! to a base path, plus a skill-library listing tool. `WorkspaceToolProvider`
//! resolves the fixed set; `SimpleToolProvider` is a map-backed provider for
//! embedders and tests.

pub mod file_ops;
pub mod provider;
pub mod skills_tool;

pub use file_ops::{ListDirTool, ReadFileTool, SearchFilesTool};
pub use provider::{SimpleToolProvider, WorkspaceToolProvider};
pub use skills_tool::ListSkillsTool;
