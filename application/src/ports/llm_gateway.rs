//! LLM backend port
//!
//! Defines the interface for sending chat completions to a provider.
//! Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use council_domain::ProviderAdapter;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during a backend call
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("No credential for provider {0}")]
    MissingCredential(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A single chat completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Model id as the provider knows it
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
}

impl ChatRequest {
    /// Request with a single user message.
    pub fn user(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
            max_tokens: None,
            json_mode: false,
        }
    }

    /// Request with a system prompt followed by a user message.
    pub fn with_system(
        model: impl Into<String>,
        system: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(content)],
            max_tokens: None,
            json_mode: false,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// A chat-completion client bound to one provider and credential
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Adapter variant this client talks to
    fn adapter(&self) -> ProviderAdapter;

    /// Send the request and return the first choice's text
    async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}

/// Builds backend clients for an adapter variant and API key
pub trait BackendFactory: Send + Sync {
    fn get_client(
        &self,
        adapter: ProviderAdapter,
        api_key: &str,
    ) -> Result<Arc<dyn LlmBackend>, GatewayError>;
}
