//! Skill library for repowiki agents
//!
//! Skills are markdown playbooks (`SKILL.md` with YAML front matter) kept one
//! per subdirectory. The middleware built from them exposes a single `skill`
//! tool that dispatches to named skills, plus instruction text telling the
//! agent when to reach for it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod middleware;

pub use middleware::SkillMiddleware;

/// A skill loaded from a SKILL.md file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    pub description: String,
    /// Full markdown body, front matter stripped
    pub content: String,
    pub path: PathBuf,
    pub loaded_at: DateTime<Utc>,
}

/// Skill-listing capability consumed by the agent coordinator
pub trait SkillSource: Send + Sync {
    fn list(&self) -> Result<Vec<SkillDefinition>>;
}

/// Skill source backed by a local directory, one subdirectory per skill
pub struct LocalSkillSource {
    base_dir: PathBuf,
}

impl LocalSkillSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn load_skill(path: &Path) -> Result<SkillDefinition> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read skill file {}", path.display()))?;
        let (front, body) = split_front_matter(&raw)
            .with_context(|| format!("missing front matter in {}", path.display()))?;

        let meta: SkillFrontMatter = serde_yaml::from_str(front)
            .with_context(|| format!("invalid front matter in {}", path.display()))?;
        if meta.name.is_empty() {
            anyhow::bail!("skill name is required in {}", path.display());
        }

        Ok(SkillDefinition {
            name: meta.name,
            description: meta.description,
            content: body.trim_start().to_string(),
            path: path.to_path_buf(),
            loaded_at: Utc::now(),
        })
    }
}

impl SkillSource for LocalSkillSource {
    /// Walk the base directory and load every `<dir>/SKILL.md`.
    ///
    /// A broken skill is logged and skipped; it never fails the listing.
    /// A missing base directory yields an empty list.
    fn list(&self) -> Result<Vec<SkillDefinition>> {
        let mut skills = Vec::new();

        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(skills),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read skills directory {}", self.base_dir.display()))
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let skill_file = dir.join("SKILL.md");
            if !skill_file.exists() {
                continue;
            }
            match Self::load_skill(&skill_file) {
                Ok(skill) => {
                    tracing::debug!(skill = %skill.name, path = %skill_file.display(), "loaded skill");
                    skills.push(skill);
                }
                Err(e) => {
                    tracing::warn!(path = %skill_file.display(), error = %e, "skipping broken skill");
                }
            }
        }

        Ok(skills)
    }
}

#[derive(Debug, Deserialize)]
struct SkillFrontMatter {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

/// Split a `---` delimited YAML front matter block from the markdown body
fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let front = &rest[..end];
    let body = rest[end + 4..].strip_prefix('\n').unwrap_or(&rest[end + 4..]);
    Some((front, body))
}

/// Index skills by name, last one wins on duplicates
pub fn index_by_name(skills: Vec<SkillDefinition>) -> HashMap<String, SkillDefinition> {
    skills.into_iter().map(|s| (s.name.clone(), s)).collect()
}
