use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use repowiki_skills::{LocalSkillSource, SkillSource};
use repowiki_types::{ParameterDefinition, Tool, ToolParameters, ToolResult};

/// List the skills available in the local skill library
pub struct ListSkillsTool {
    skills_dir: PathBuf,
}

impl ListSkillsTool {
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self { skills_dir: skills_dir.into() }
    }
}

#[async_trait]
impl Tool for ListSkillsTool {
    fn name(&self) -> &str {
        "list_skills"
    }

    fn description(&self) -> &str {
        "List the names and descriptions of all skills in the skill library"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::new()
    }

    async fn execute(&self, _params: ToolParameters) -> ToolResult {
        let skills = match LocalSkillSource::new(&self.skills_dir).list() {
            Ok(skills) => skills,
            Err(e) => return ToolResult::error(format!("failed to list skills: {e:#}")),
        };

        if skills.is_empty() {
            return ToolResult::success("no skills available".to_string());
        }

        let lines: Vec<String> =
            skills.iter().map(|s| format!("{}: {}", s.name, s.description)).collect();
        ToolResult::success(lines.join("\n"))
    }
}
