//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod credentials;
mod logging;
mod output;
mod providers;
mod run;
mod storage;

pub use credentials::FileCredentialsConfig;
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use providers::{FileEndpointConfig, FileProvidersConfig};
pub use run::FileRunConfig;
pub use storage::FileStorageConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems found in an otherwise loadable configuration.
///
/// None of these stop a run; the CLI prints them as warnings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{field}: unknown provider '{value}' (openrouter, groq, openai, anthropic, gemini)")]
    UnknownProvider { field: &'static str, value: String },

    #[error("run.model_count = {0} is outside 1..=4 and will be clamped")]
    ModelCountOutOfRange(usize),

    #[error("providers.{0}.max_tokens cannot be 0")]
    ZeroMaxTokens(&'static str),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Stored API keys
    pub credentials: FileCredentialsConfig,
    /// Run defaults
    pub run: FileRunConfig,
    /// Endpoint overrides per provider
    pub providers: FileProvidersConfig,
    /// Conversation storage
    pub storage: FileStorageConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log sinks
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if let Some(value) = &self.credentials.provider
            && self.credentials.parse_provider().is_none()
        {
            issues.push(ConfigIssue::UnknownProvider {
                field: "credentials.provider",
                value: value.clone(),
            });
        }

        if let Some(value) = &self.run.preferred_provider
            && self.run.parse_preferred_provider().is_none()
        {
            issues.push(ConfigIssue::UnknownProvider {
                field: "run.preferred_provider",
                value: value.clone(),
            });
        }

        if !self.run.model_count_in_range() {
            issues.push(ConfigIssue::ModelCountOutOfRange(self.run.model_count));
        }

        issues.extend(
            self.providers
                .zero_max_tokens()
                .into_iter()
                .map(ConfigIssue::ZeroMaxTokens),
        );

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{OutputFormat, ProviderFamily};
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[credentials]
openrouter_api_key = "sk-or-v1-abc"
universal_key = "gsk_123"

[run]
model_count = 2
save = false
preferred_provider = "groq"

[providers.openrouter]
title = "My Council"
max_tokens = 1024

[storage]
dir = "/tmp/council"

[output]
format = "json"
color = false

[logging]
event_log = "/tmp/council/events.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.credentials.openrouter_api_key.as_deref(), Some("sk-or-v1-abc"));
        assert_eq!(config.run.model_count, 2);
        assert!(!config.run.save);
        assert_eq!(config.run.parse_preferred_provider(), Some(ProviderFamily::Groq));
        assert_eq!(config.providers.openrouter.max_tokens, Some(1024));
        assert_eq!(config.storage.dir, Some(PathBuf::from("/tmp/council")));
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert_eq!(
            config.logging.event_log,
            Some(PathBuf::from("/tmp/council/events.jsonl"))
        );
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.run.model_count, 4);
        assert!(config.run.save);
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let toml_str = r#"
[credentials]
provider = "bedrock"

[run]
model_count = 9

[providers.groq]
max_tokens = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();

        assert_eq!(issues.len(), 3);
        assert!(matches!(
            &issues[0],
            ConfigIssue::UnknownProvider { field: "credentials.provider", value } if value == "bedrock"
        ));
        assert_eq!(issues[1], ConfigIssue::ModelCountOutOfRange(9));
        assert_eq!(issues[2], ConfigIssue::ZeroMaxTokens("groq"));
    }
}
