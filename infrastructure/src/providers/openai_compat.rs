//! OpenAI-compatible chat completions backend
//!
//! OpenRouter, Groq and OpenAI all speak the `/chat/completions` wire format,
//! so one reqwest-based client covers every [`ProviderAdapter`]. Only the base
//! URL, the default token limit and (for OpenRouter) two attribution headers
//! differ between them.

use async_trait::async_trait;
use council_application::ports::llm_gateway::{
    BackendFactory, ChatMessage, ChatRequest, GatewayError, LlmBackend,
};
use council_domain::ProviderAdapter;
use council_domain::util::take_chars;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default HTTP-Referer sent to OpenRouter
pub const DEFAULT_REFERER: &str = "http://localhost:8000";

/// Default X-Title sent to OpenRouter
pub const DEFAULT_TITLE: &str = "Consensus Council";

/// Token limit used when a request does not set its own
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body echoed back in a [`GatewayError::Api`]
const ERROR_BODY_CHARS: usize = 500;

/// Where and how to reach one adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub max_tokens: u32,
    /// `HTTP-Referer` header, sent only when set
    pub referer: Option<String>,
    /// `X-Title` header, sent only when set
    pub title: Option<String>,
}

impl EndpointConfig {
    /// Built-in endpoint for `adapter`.
    pub fn default_for(adapter: ProviderAdapter) -> Self {
        let (base_url, attribution) = match adapter {
            ProviderAdapter::OpenRouter => (OPENROUTER_BASE_URL, true),
            ProviderAdapter::Groq => (GROQ_BASE_URL, false),
            ProviderAdapter::OpenAi => (OPENAI_BASE_URL, false),
        };
        Self {
            base_url: base_url.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            referer: attribution.then(|| DEFAULT_REFERER.to_string()),
            title: attribution.then(|| DEFAULT_TITLE.to_string()),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Endpoint settings for every adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub openrouter: EndpointConfig,
    pub groq: EndpointConfig,
    pub openai: EndpointConfig,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            openrouter: EndpointConfig::default_for(ProviderAdapter::OpenRouter),
            groq: EndpointConfig::default_for(ProviderAdapter::Groq),
            openai: EndpointConfig::default_for(ProviderAdapter::OpenAi),
        }
    }
}

impl ProviderEndpoints {
    pub fn get(&self, adapter: ProviderAdapter) -> &EndpointConfig {
        match adapter {
            ProviderAdapter::OpenRouter => &self.openrouter,
            ProviderAdapter::Groq => &self.groq,
            ProviderAdapter::OpenAi => &self.openai,
        }
    }
}

/// Chat completions client for one adapter and API key
pub struct OpenAiCompatBackend {
    client: Client,
    adapter: ProviderAdapter,
    endpoint: EndpointConfig,
    api_key: String,
}

impl OpenAiCompatBackend {
    pub fn new(
        client: Client,
        adapter: ProviderAdapter,
        endpoint: EndpointConfig,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            adapter,
            endpoint,
            api_key: api_key.into(),
        }
    }

    fn build_body<'a>(&self, request: &'a ChatRequest) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: request.max_tokens.unwrap_or(self.endpoint.max_tokens),
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    fn adapter(&self) -> ProviderAdapter {
        self.adapter
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        debug!(
            provider = self.adapter.name(),
            model = %request.model,
            json_mode = request.json_mode,
            "Sending chat completion"
        );

        let mut http = self
            .client
            .post(self.endpoint.completions_url())
            .bearer_auth(&self.api_key)
            .json(&self.build_body(request));
        if let Some(referer) = &self.endpoint.referer {
            http = http.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.endpoint.title {
            http = http.header("X-Title", title);
        }

        let response = http.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let content = parse_completion(&body)?;
        debug!(
            provider = self.adapter.name(),
            model = %request.model,
            chars = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }
}

/// Hands out [`OpenAiCompatBackend`]s sharing one connection pool.
pub struct HttpBackendFactory {
    client: Client,
    endpoints: ProviderEndpoints,
}

impl HttpBackendFactory {
    pub fn new(endpoints: ProviderEndpoints) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }
}

impl BackendFactory for HttpBackendFactory {
    fn get_client(
        &self,
        adapter: ProviderAdapter,
        api_key: &str,
    ) -> Result<Arc<dyn LlmBackend>, GatewayError> {
        if api_key.trim().is_empty() {
            return Err(GatewayError::MissingCredential(adapter.name().to_string()));
        }
        Ok(Arc::new(OpenAiCompatBackend::new(
            self.client.clone(),
            adapter,
            self.endpoints.get(adapter).clone(),
            api_key,
        )))
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

/// Provider error text from an error body, `{"error": {"message": ...}}` if
/// present, otherwise the truncated raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| take_chars(body.trim(), ERROR_BODY_CHARS).to_string())
}

/// Text of the first choice of a successful response body.
fn parse_completion(body: &str) -> Result<String, GatewayError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("malformed completion: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GatewayError::InvalidResponse("response has no choices[0] content".into()))
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
