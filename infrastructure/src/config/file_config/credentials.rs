//! Credential configuration from TOML (`[credentials]` section)

use council_application::{Credentials, EnvKeys};
use council_domain::ProviderFamily;
use serde::{Deserialize, Serialize};

/// Raw credential configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCredentialsConfig {
    pub openrouter_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// Single key of any provider
    pub universal_key: Option<String>,
    /// Provider of `universal_key`; detected from the key format when unset
    pub provider: Option<String>,
}

impl FileCredentialsConfig {
    /// Parse `provider`, `None` when unset or unknown.
    pub fn parse_provider(&self) -> Option<ProviderFamily> {
        self.provider.as_deref().and_then(|p| p.parse().ok())
    }

    /// Build the initial credential set. Blank keys count as unset.
    pub fn to_credentials(&self, env: EnvKeys) -> Credentials {
        Credentials {
            openrouter_key: non_blank(&self.openrouter_api_key),
            groq_key: non_blank(&self.groq_api_key),
            universal_key: non_blank(&self.universal_key),
            universal_family: self.parse_provider(),
            env,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::ProviderAdapter;

    #[test]
    fn test_blank_keys_are_unset() {
        let config = FileCredentialsConfig {
            openrouter_api_key: Some("   ".into()),
            groq_api_key: Some(" gsk_abc ".into()),
            ..Default::default()
        };
        let credentials = config.to_credentials(EnvKeys::default());
        assert!(credentials.openrouter_key.is_none());
        assert_eq!(credentials.groq_key.as_deref(), Some("gsk_abc"));
    }

    #[test]
    fn test_universal_key_with_explicit_provider() {
        let config = FileCredentialsConfig {
            universal_key: Some("plain-key".into()),
            provider: Some("groq".into()),
            ..Default::default()
        };
        let credentials = config.to_credentials(EnvKeys::default());
        assert_eq!(credentials.legacy_family(), Some(ProviderFamily::Groq));
        assert_eq!(credentials.key_for(ProviderAdapter::Groq), Some("plain-key"));
    }

    #[test]
    fn test_unknown_provider_falls_back_to_detection() {
        let config = FileCredentialsConfig {
            provider: Some("bedrock".into()),
            ..Default::default()
        };
        assert_eq!(config.parse_provider(), None);
    }
}
