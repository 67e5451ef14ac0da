// ABOUTME: Assembles the assistant's startup command line and launch environment
// Validation happens here so a half-configured session is never launched

use crate::channel::LaunchSpec;
use crate::config::{AppConfig, ConfigError};
use std::path::Path;

/// Assemble base command, model flag, startup args and feature flags.
///
/// Feature flags already present anywhere in the accumulated line are
/// skipped, so a flag given in `startup_args` is not repeated.
pub fn build_command_line(config: &AppConfig) -> Result<String, ConfigError> {
    let base = config.command_line.trim();
    if base.is_empty() {
        return Err(ConfigError::MissingCommand);
    }

    let mut line = base.to_string();
    let startup_args = config.startup_args.trim();

    match config.provider.model_flag() {
        Some(flag) => push_arg(&mut line, flag),
        None => {
            if !startup_args.contains("--model") && !base.contains("--model") {
                return Err(ConfigError::MissingModel);
            }
        }
    }

    if !startup_args.is_empty() {
        push_arg(&mut line, startup_args);
    }

    for flag in &config.feature_flags {
        let flag = flag.trim();
        if !flag.is_empty() && !line.contains(flag) {
            push_arg(&mut line, flag);
        }
    }

    Ok(line)
}

fn push_arg(line: &mut String, arg: &str) {
    line.push(' ');
    line.push_str(arg);
}

/// Full launch description for a session rooted at `working_directory`.
pub fn build_launch_spec(
    config: &AppConfig,
    name: &str,
    working_directory: &Path,
) -> Result<LaunchSpec, ConfigError> {
    let env = config.provider.environment()?;
    let command_line = build_command_line(config)?;

    Ok(LaunchSpec {
        name: name.to_string(),
        working_directory: working_directory.to_path_buf(),
        command_line,
        env,
    })
}
