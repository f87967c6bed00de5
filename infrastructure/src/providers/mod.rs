//! LLM provider adapters
//!
//! Every supported provider speaks the OpenAI chat completions format, so a
//! single HTTP backend implements the [`LlmBackend`] port for all of them.
//!
//! [`LlmBackend`]: council_application::LlmBackend

mod openai_compat;

pub use openai_compat::{
    DEFAULT_MAX_TOKENS, DEFAULT_REFERER, DEFAULT_TITLE, EndpointConfig, HttpBackendFactory,
    OpenAiCompatBackend, ProviderEndpoints,
};
