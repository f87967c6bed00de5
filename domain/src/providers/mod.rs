//! Provider families, adapter variants and their default model catalogs.
//!
//! A [`ProviderFamily`] names where a credential belongs. A
//! [`ProviderAdapter`] is the closed set of backends this system can actually
//! talk to; families without a native adapter are served by OpenRouter.

pub mod detection;

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Backend family a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenRouter,
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    Unknown,
}

impl ProviderFamily {
    /// Primary family, tried first when resolving a backend
    pub const PRIMARY: ProviderFamily = ProviderFamily::OpenRouter;
    /// Secondary family, tried after the primary one
    pub const SECONDARY: ProviderFamily = ProviderFamily::Groq;

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFamily::OpenRouter => "openrouter",
            ProviderFamily::Groq => "groq",
            ProviderFamily::OpenAi => "openai",
            ProviderFamily::Anthropic => "anthropic",
            ProviderFamily::Gemini => "gemini",
            ProviderFamily::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderFamily {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(ProviderFamily::OpenRouter),
            "groq" => Ok(ProviderFamily::Groq),
            "openai" => Ok(ProviderFamily::OpenAi),
            "anthropic" => Ok(ProviderFamily::Anthropic),
            "gemini" => Ok(ProviderFamily::Gemini),
            "unknown" => Ok(ProviderFamily::Unknown),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// What a backend can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chat,
    JsonMode,
    Tools,
    Vision,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Chat => "chat",
            Capability::JsonMode => "json_mode",
            Capability::Tools => "tools",
            Capability::Vision => "vision",
        }
    }
}

/// One entry of a provider's default model catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model id sent to the backend, e.g. "openai/gpt-4o"
    pub id: String,
    /// Name used to identify the model throughout a run
    pub display_name: String,
    pub family: ProviderFamily,
}

impl ModelDescriptor {
    pub fn new(id: &str, display_name: &str, family: ProviderFamily) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            family,
        }
    }

    /// Model id without a vendor prefix ("openai/gpt-4o" -> "gpt-4o").
    pub fn short_id(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// Backend variants with a native client (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderAdapter {
    OpenRouter,
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderAdapter {
    /// Factory: map a family tag to the adapter that serves it.
    ///
    /// Families without a native adapter fall back to OpenRouter, which
    /// proxies most vendors.
    pub fn for_family(family: ProviderFamily) -> Self {
        match family {
            ProviderFamily::Groq => ProviderAdapter::Groq,
            ProviderFamily::OpenAi => ProviderAdapter::OpenAi,
            ProviderFamily::OpenRouter
            | ProviderFamily::Anthropic
            | ProviderFamily::Gemini
            | ProviderFamily::Unknown => ProviderAdapter::OpenRouter,
        }
    }

    pub fn family(&self) -> ProviderFamily {
        match self {
            ProviderAdapter::OpenRouter => ProviderFamily::OpenRouter,
            ProviderAdapter::Groq => ProviderFamily::Groq,
            ProviderAdapter::OpenAi => ProviderFamily::OpenAi,
        }
    }

    /// Human-readable provider name
    pub fn name(&self) -> &'static str {
        match self {
            ProviderAdapter::OpenRouter => "OpenRouter",
            ProviderAdapter::Groq => "Groq",
            ProviderAdapter::OpenAi => "OpenAI",
        }
    }

    /// Priority-ordered default model catalog
    pub fn default_models(&self) -> Vec<ModelDescriptor> {
        let family = self.family();
        match self {
            ProviderAdapter::OpenRouter => vec![
                ModelDescriptor::new("openai/gpt-4o", "GPT-4o (OR)", family),
                ModelDescriptor::new(
                    "anthropic/claude-3.5-sonnet",
                    "Claude 3.5 Sonnet (OR)",
                    family,
                ),
                ModelDescriptor::new(
                    "google/gemini-2.0-flash-exp:free",
                    "Gemini 2.0 Flash (OR)",
                    family,
                ),
            ],
            ProviderAdapter::Groq => vec![
                ModelDescriptor::new("llama-3.3-70b-versatile", "Llama 3.3 70B", family),
                ModelDescriptor::new("llama3-70b-8192", "Llama 3 70B", family),
                ModelDescriptor::new("mixtral-8x7b-32768", "Mixtral 8x7B", family),
            ],
            ProviderAdapter::OpenAi => vec![
                ModelDescriptor::new("gpt-4o", "GPT-4o", family),
                ModelDescriptor::new("gpt-4-turbo", "GPT-4 Turbo", family),
                ModelDescriptor::new("gpt-3.5-turbo", "GPT-3.5 Turbo", family),
            ],
        }
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        match self {
            ProviderAdapter::OpenRouter | ProviderAdapter::OpenAi => vec![
                Capability::Chat,
                Capability::JsonMode,
                Capability::Tools,
                Capability::Vision,
            ],
            ProviderAdapter::Groq => vec![Capability::Chat, Capability::JsonMode, Capability::Tools],
        }
    }

    /// Inexpensive model for normalization and claim extraction
    pub fn utility_model(&self) -> &'static str {
        match self {
            ProviderAdapter::OpenRouter => "openai/gpt-4o-mini",
            ProviderAdapter::Groq => "llama3-70b-8192",
            ProviderAdapter::OpenAi => "gpt-3.5-turbo",
        }
    }

    /// Strongest model, used for the final synthesis
    pub fn chairman_model(&self) -> String {
        match self {
            ProviderAdapter::OpenRouter => "openai/gpt-4o".to_string(),
            ProviderAdapter::Groq => "llama-3.3-70b-versatile".to_string(),
            ProviderAdapter::OpenAi => self
                .default_models()
                .first()
                .map(|m| m.id.clone())
                .unwrap_or_else(|| self.utility_model().to_string()),
        }
    }
}

impl std::fmt::Display for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
