// ABOUTME: Configuration errors raised before any assistant process is started

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key for {provider}; set it in the config file or {env_var}")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Custom provider selected but the startup arguments do not choose a model (--model)")]
    MissingModel,

    #[error("Assistant command line is empty")]
    MissingCommand,

    #[error("No working directory configured")]
    NoWorkingDirectory,

    #[error("Working directory is not an absolute, existing directory: {0}")]
    InvalidWorkingDirectory(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
