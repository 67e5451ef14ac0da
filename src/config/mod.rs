// ABOUTME: Application configuration loaded from ~/.aider-bridge/config.toml
// Missing files fall back to defaults; credentials may come from the environment

pub mod error;
pub mod provider;

pub use error::ConfigError;
pub use provider::{AnthropicModel, OpenAiModel, ProviderConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const COMMAND_ENV_VAR: &str = "AIDER_BRIDGE_COMMAND";
pub const WORKING_DIR_ENV_VAR: &str = "AIDER_BRIDGE_WORKING_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base command that starts the assistant
    pub command_line: String,
    /// Directory the root search starts from
    pub working_directory: Option<PathBuf>,
    pub provider: ProviderConfig,
    /// Free-form extra startup arguments, appended verbatim
    pub startup_args: String,
    /// Flags appended once each, e.g. `--no-auto-commits`
    pub feature_flags: Vec<String>,
    /// Ignore patterns applied in addition to the project's ignore list
    pub ignore_patterns: Vec<String>,
    pub sync_debounce_ms: u64,
    pub dictation_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command_line: "aider".to_string(),
            working_directory: None,
            provider: ProviderConfig::default(),
            startup_args: String::new(),
            feature_flags: Vec::new(),
            ignore_patterns: Vec::new(),
            sync_debounce_ms: 300,
            dictation_delay_ms: 500,
        }
    }
}

impl AppConfig {
    /// `~/.aider-bridge/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".aider-bridge").join("config.toml"))
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok());
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(command) = lookup(COMMAND_ENV_VAR).filter(|c| !c.trim().is_empty()) {
            self.command_line = command;
        }
        if let Some(dir) = lookup(WORKING_DIR_ENV_VAR).filter(|d| !d.trim().is_empty()) {
            self.working_directory = Some(PathBuf::from(dir));
        }
        self.provider.fill_credentials(lookup);
    }

    /// Whether switching from `self` to `other` needs a fresh session.
    pub fn requires_restart(&self, other: &Self) -> bool {
        self.provider != other.provider
    }

    pub fn sync_debounce(&self) -> Duration {
        Duration::from_millis(self.sync_debounce_ms)
    }

    pub fn dictation_delay(&self) -> Duration {
        Duration::from_millis(self.dictation_delay_ms)
    }

    /// The start directory for root resolution, validated.
    pub fn start_directory(&self) -> Result<&Path, ConfigError> {
        let dir = self
            .working_directory
            .as_deref()
            .ok_or(ConfigError::NoWorkingDirectory)?;
        if !dir.is_absolute() || !dir.is_dir() {
            return Err(ConfigError::InvalidWorkingDirectory(dir.to_path_buf()));
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.sync_debounce(), Duration::from_millis(300));
        assert_eq!(config.dictation_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "command_line = \"aider --no-pretty\"\nfeature_flags = [\"--no-auto-commits\"]\n\n[provider]\nkind = \"anthropic\"\nmodel = \"opus\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.command_line, "aider --no-pretty");
        assert_eq!(config.feature_flags, vec!["--no-auto-commits".to_string()]);
        assert_eq!(config.provider.model_flag(), Some("--opus"));
        assert_eq!(config.dictation_delay_ms, 500);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "command_line = [").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env(|var| match var {
            COMMAND_ENV_VAR => Some("/opt/aider".to_string()),
            WORKING_DIR_ENV_VAR => Some("/work".to_string()),
            provider::ANTHROPIC_KEY_VAR => Some("sk-ant".to_string()),
            _ => None,
        });
        assert_eq!(config.command_line, "/opt/aider");
        assert_eq!(config.working_directory, Some(PathBuf::from("/work")));
        assert!(config.provider.environment().is_ok());
    }

    #[test]
    fn test_start_directory_validation() {
        let mut config = AppConfig::default();
        assert!(matches!(config.start_directory(), Err(ConfigError::NoWorkingDirectory)));

        config.working_directory = Some(PathBuf::from("relative/dir"));
        assert!(matches!(config.start_directory(), Err(ConfigError::InvalidWorkingDirectory(_))));

        let temp = TempDir::new().unwrap();
        config.working_directory = Some(temp.path().to_path_buf());
        assert_eq!(config.start_directory().unwrap(), temp.path());
    }

    #[test]
    fn test_restart_only_on_provider_change() {
        let base = AppConfig::default();
        let mut other = base.clone();
        other.startup_args = "--dark-mode".to_string();
        assert!(!base.requires_restart(&other));

        other.provider = ProviderConfig::Anthropic {
            api_key: "new".to_string(),
            model: AnthropicModel::Sonnet,
        };
        assert!(base.requires_restart(&other));
    }
}
