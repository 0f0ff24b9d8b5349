use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repowiki_types::{param, ParameterDefinition, Tool, ToolParameters, ToolResult};

use crate::{SkillDefinition, SkillSource};

/// Optional capability layer exposing the skill library to an agent.
///
/// Built once per coordinator. When the source lists zero skills the
/// constructor returns `None` and the coordinator omits the layer entirely:
/// no `skill` tool, no extra instruction text.
pub struct SkillMiddleware {
    skills: Vec<SkillDefinition>,
    by_name: HashMap<String, SkillDefinition>,
}

impl SkillMiddleware {
    pub fn from_source(source: &dyn SkillSource) -> Result<Option<Self>> {
        let skills = source.list()?;
        if skills.is_empty() {
            return Ok(None);
        }
        tracing::info!(count = skills.len(), "skill middleware enabled");

        let by_name = crate::index_by_name(skills.clone());
        Ok(Some(Self { skills, by_name }))
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    /// Instruction text prefixed to an agent's own instruction when skills
    /// are present
    pub fn instruction_preamble(&self) -> String {
        let mut lines = vec![
            "You have access to a skill library via the `skill` tool. When a task \
             matches one of the skills below, call `skill` with its name and follow \
             the returned playbook before improvising."
                .to_string(),
            String::new(),
            "Available skills:".to_string(),
        ];
        for skill in &self.skills {
            lines.push(format!("- {}: {}", skill.name, skill.description));
        }
        lines.join("\n")
    }

    /// The single dispatching `skill` tool
    pub fn skill_tool(&self) -> Arc<dyn Tool> {
        Arc::new(SkillTool { by_name: self.by_name.clone() })
    }
}

/// Tool that returns the body of a named skill
struct SkillTool {
    by_name: HashMap<String, SkillDefinition>,
}

#[async_trait]
impl Tool for SkillTool {
    fn name(&self) -> &str {
        "skill"
    }

    fn description(&self) -> &str {
        "Load the playbook for a named skill from the skill library"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("name", "string", "Name of the skill to load", required)])
    }

    async fn execute(&self, params: ToolParameters) -> ToolResult {
        let name: String = match params.get_required("name") {
            Ok(name) => name,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match self.by_name.get(&name) {
            Some(skill) => ToolResult::success(skill.content.clone()),
            None => {
                let known: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
                ToolResult::error(format!("unknown skill '{}', available: {}", name, known.join(", ")))
            }
        }
    }
}
