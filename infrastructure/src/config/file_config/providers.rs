//! Provider endpoint configuration from TOML (`[providers]` section)

use crate::providers::{EndpointConfig, ProviderEndpoints};
use council_domain::ProviderAdapter;
use serde::{Deserialize, Serialize};

/// Overrides for one provider endpoint. Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEndpointConfig {
    /// Base URL (can be pointed at a proxy or a local compatible server)
    pub base_url: Option<String>,
    /// Default max tokens per response
    pub max_tokens: Option<u32>,
    /// `HTTP-Referer` header (OpenRouter attribution)
    pub referer: Option<String>,
    /// `X-Title` header (OpenRouter attribution)
    pub title: Option<String>,
}

impl FileEndpointConfig {
    fn apply(&self, adapter: ProviderAdapter) -> EndpointConfig {
        let mut endpoint = EndpointConfig::default_for(adapter);
        if let Some(base_url) = &self.base_url {
            endpoint.base_url = base_url.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            endpoint.max_tokens = max_tokens;
        }
        if let Some(referer) = &self.referer {
            endpoint.referer = Some(referer.clone());
        }
        if let Some(title) = &self.title {
            endpoint.title = Some(title.clone());
        }
        endpoint
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openrouter: FileEndpointConfig,
    pub groq: FileEndpointConfig,
    pub openai: FileEndpointConfig,
}

impl FileProvidersConfig {
    pub fn to_endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints {
            openrouter: self.openrouter.apply(ProviderAdapter::OpenRouter),
            groq: self.groq.apply(ProviderAdapter::Groq),
            openai: self.openai.apply(ProviderAdapter::OpenAi),
        }
    }

    /// Names of the sections whose `max_tokens` is set to 0.
    pub fn zero_max_tokens(&self) -> Vec<&'static str> {
        [
            ("openrouter", &self.openrouter),
            ("groq", &self.groq),
            ("openai", &self.openai),
        ]
        .into_iter()
        .filter(|(_, c)| c.max_tokens == Some(0))
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::DEFAULT_MAX_TOKENS;

    #[test]
    fn test_overrides_only_touch_set_fields() {
        let config = FileProvidersConfig {
            groq: FileEndpointConfig {
                base_url: Some("http://localhost:8080/v1".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let endpoints = config.to_endpoints();

        assert_eq!(endpoints.groq.base_url, "http://localhost:8080/v1");
        assert_eq!(endpoints.groq.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(endpoints.openrouter, EndpointConfig::default_for(ProviderAdapter::OpenRouter));
    }

    #[test]
    fn test_title_override() {
        let config = FileProvidersConfig {
            openrouter: FileEndpointConfig {
                title: Some("My Council".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.to_endpoints().openrouter.title.as_deref(), Some("My Council"));
    }
}
