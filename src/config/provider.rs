// ABOUTME: Provider selection and credentials for the assistant
// Each variant knows its model flag and the environment variables it needs

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnthropicModel {
    #[default]
    Sonnet,
    Opus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenAiModel {
    #[default]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Anthropic {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        model: AnthropicModel,
    },
    #[serde(rename = "openai")]
    OpenAi {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        model: OpenAiModel,
    },
    /// Model and provider come from the startup arguments; `env` is passed through.
    Custom {
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Anthropic {
            api_key: String::new(),
            model: AnthropicModel::Sonnet,
        }
    }
}

impl ProviderConfig {
    /// Model-selection flag for the command line, `None` for the custom passthrough.
    pub fn model_flag(&self) -> Option<&'static str> {
        match self {
            Self::Anthropic { model: AnthropicModel::Sonnet, .. } => Some("--sonnet"),
            Self::Anthropic { model: AnthropicModel::Opus, .. } => Some("--opus"),
            Self::OpenAi { model: OpenAiModel::Gpt4o, .. } => Some("--4o"),
            Self::Custom { .. } => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Anthropic { model: AnthropicModel::Sonnet, .. } => "Claude 3.5 Sonnet",
            Self::Anthropic { model: AnthropicModel::Opus, .. } => "Claude 3 Opus",
            Self::OpenAi { model: OpenAiModel::Gpt4o, .. } => "GPT-4o",
            Self::Custom { .. } => "Custom",
        }
    }

    /// Environment variables for the assistant process.
    pub fn environment(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        match self {
            Self::Anthropic { api_key, .. } => {
                single_credential("Anthropic", ANTHROPIC_KEY_VAR, api_key)
            }
            Self::OpenAi { api_key, .. } => single_credential("OpenAI", OPENAI_KEY_VAR, api_key),
            Self::Custom { env } => Ok(env.clone()),
        }
    }

    /// Fill an empty API key from `lookup` (normally the process environment).
    pub fn fill_credentials(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let (api_key, var) = match self {
            Self::Anthropic { api_key, .. } => (api_key, ANTHROPIC_KEY_VAR),
            Self::OpenAi { api_key, .. } => (api_key, OPENAI_KEY_VAR),
            Self::Custom { .. } => return,
        };
        if api_key.trim().is_empty() {
            if let Some(value) = lookup(var) {
                *api_key = value;
            }
        }
    }
}

fn single_credential(
    provider: &'static str,
    env_var: &'static str,
    api_key: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ConfigError::MissingCredential { provider, env_var });
    }
    Ok(BTreeMap::from([(env_var.to_string(), key.to_string())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_flags() {
        assert_eq!(ProviderConfig::default().model_flag(), Some("--sonnet"));
        let opus = ProviderConfig::Anthropic { api_key: "k".into(), model: AnthropicModel::Opus };
        assert_eq!(opus.model_flag(), Some("--opus"));
        let gpt = ProviderConfig::OpenAi { api_key: "k".into(), model: OpenAiModel::Gpt4o };
        assert_eq!(gpt.model_flag(), Some("--4o"));
        assert_eq!(ProviderConfig::Custom { env: BTreeMap::new() }.model_flag(), None);
    }

    #[test]
    fn test_empty_key_is_a_configuration_error() {
        let provider = ProviderConfig::Anthropic { api_key: "  ".into(), model: AnthropicModel::Sonnet };
        assert!(matches!(
            provider.environment(),
            Err(ConfigError::MissingCredential { env_var: ANTHROPIC_KEY_VAR, .. })
        ));
    }

    #[test]
    fn test_fill_credentials_only_when_empty() {
        let mut provider = ProviderConfig::OpenAi { api_key: String::new(), model: OpenAiModel::Gpt4o };
        provider.fill_credentials(|var| (var == OPENAI_KEY_VAR).then(|| "sk-env".to_string()));
        assert_eq!(provider.environment().unwrap().get(OPENAI_KEY_VAR).map(String::as_str), Some("sk-env"));

        let mut set = ProviderConfig::OpenAi { api_key: "sk-file".into(), model: OpenAiModel::Gpt4o };
        set.fill_credentials(|_| Some("sk-env".to_string()));
        assert_eq!(set.environment().unwrap().get(OPENAI_KEY_VAR).map(String::as_str), Some("sk-file"));
    }

    #[test]
    fn test_provider_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: ProviderConfig,
        }
        let parsed: Wrapper = toml::from_str(
            "[provider]\nkind = \"openai\"\napi_key = \"sk\"\nmodel = \"gpt-4o\"\n",
        )
        .unwrap();
        assert_eq!(
            parsed.provider,
            ProviderConfig::OpenAi { api_key: "sk".into(), model: OpenAiModel::Gpt4o }
        );
    }
}
