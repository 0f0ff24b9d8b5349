use std::path::PathBuf;
use std::time::Duration;

/// Overrides the default agent definition directory when set
pub const AGENTS_DIR_ENV: &str = "REPOWIKI_AGENTS_DIR";

/// Construction-time settings for the agent coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Directory holding one YAML definition file per agent
    pub agents_dir: PathBuf,
    /// Watch the directory and hot-reload definitions
    pub watch: bool,
    pub poll_interval: Duration,
    /// Minimum age of a modification before it is acted on
    pub debounce: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            agents_dir: PathBuf::from("./agents"),
            watch: true,
            poll_interval: Duration::from_secs(5),
            debounce: Duration::from_secs(1),
        }
    }
}

impl CoordinatorConfig {
    /// Defaults with the agents directory taken from `REPOWIKI_AGENTS_DIR`
    /// when set and non-empty
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(AGENTS_DIR_ENV) {
            if !dir.is_empty() {
                config.agents_dir = PathBuf::from(dir);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.agents_dir, PathBuf::from("./agents"));
        assert!(config.watch);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.debounce, Duration::from_secs(1));
    }

    #[test]
    fn test_env_override() {
        std::env::set_var(AGENTS_DIR_ENV, "/srv/agents");
        let config = CoordinatorConfig::from_env();
        std::env::remove_var(AGENTS_DIR_ENV);
        assert_eq!(config.agents_dir, PathBuf::from("/srv/agents"));
    }
}
