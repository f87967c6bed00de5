//! Provider registry
//!
//! Resolves which backends are usable from one [`Credentials`] snapshot.
//! Every stage of a run goes through the same registry, so a run never sees
//! a credential change halfway through.

use crate::config::Credentials;
use crate::ports::llm_gateway::{BackendFactory, GatewayError, LlmBackend};
use council_domain::{Capability, ModelDescriptor, ProviderAdapter, ProviderFamily};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of catalog models used as peer reviewers
pub const REVIEWER_COUNT: usize = 2;

/// The backend chosen for the single-call stages of a run
#[derive(Clone)]
pub struct ResolvedProvider {
    /// Family of the credential that won resolution
    pub family: ProviderFamily,
    pub adapter: ProviderAdapter,
    pub backend: Arc<dyn LlmBackend>,
    /// Priority-ordered catalog of `adapter`
    pub models: Vec<ModelDescriptor>,
}

impl ResolvedProvider {
    pub fn utility_model(&self) -> &'static str {
        self.adapter.utility_model()
    }

    pub fn chairman_model(&self) -> String {
        self.adapter.chairman_model()
    }

    /// The first catalog models, used as peer reviewers.
    pub fn reviewer_models(&self) -> &[ModelDescriptor] {
        &self.models[..self.models.len().min(REVIEWER_COUNT)]
    }
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("family", &self.family)
            .field("adapter", &self.adapter)
            .field("models", &self.models.len())
            .finish()
    }
}

/// Availability of one provider, as shown by `providers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub id: ProviderFamily,
    pub name: &'static str,
    pub available: bool,
    /// Catalog, listed only when the provider is available
    pub models: Vec<ModelDescriptor>,
    pub capabilities: Vec<Capability>,
}

pub struct ProviderRegistry {
    credentials: Credentials,
    factory: Arc<dyn BackendFactory>,
}

impl ProviderRegistry {
    pub fn new(credentials: Credentials, factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            credentials,
            factory,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn has_credential(&self, family: ProviderFamily) -> bool {
        self.credentials.has_credential(family)
    }

    pub fn default_model_catalog(&self, family: ProviderFamily) -> Vec<ModelDescriptor> {
        ProviderAdapter::for_family(family).default_models()
    }

    /// Build a client for `adapter` with an explicit key.
    pub fn get_backend(
        &self,
        adapter: ProviderAdapter,
        api_key: &str,
    ) -> Result<Arc<dyn LlmBackend>, GatewayError> {
        self.factory.get_client(adapter, api_key)
    }

    /// Build a client for `adapter` from the snapshot's credentials.
    pub fn backend_for(&self, adapter: ProviderAdapter) -> Result<Arc<dyn LlmBackend>, GatewayError> {
        let key = self
            .credentials
            .key_for(adapter)
            .ok_or_else(|| GatewayError::MissingCredential(adapter.family().to_string()))?;
        self.get_backend(adapter, key)
    }

    /// Pick the backend for single-call stages.
    ///
    /// An explicitly preferred family wins when it has a key. Otherwise the
    /// candidates of [`Credentials::resolution_order`] are tried in turn.
    /// Returns `None` only when no candidate yields a client.
    pub fn resolve(&self, preferred: Option<ProviderFamily>) -> Option<ResolvedProvider> {
        let preferred = preferred.and_then(|family| {
            let adapter = ProviderAdapter::for_family(family);
            self.credentials.key_for(adapter).map(|key| (family, key))
        });

        preferred
            .into_iter()
            .chain(self.credentials.resolution_order())
            .find_map(|(family, key)| {
                let adapter = ProviderAdapter::for_family(family);
                match self.get_backend(adapter, key) {
                    Ok(backend) => {
                        debug!(family = %family, adapter = %adapter, "Resolved provider");
                        Some(ResolvedProvider {
                            family,
                            adapter,
                            backend,
                            models: adapter.default_models(),
                        })
                    }
                    Err(e) => {
                        warn!(family = %family, error = %e, "Could not build client");
                        None
                    }
                }
            })
    }

    /// Catalogs of every credentialed primary/secondary family, OpenRouter
    /// first. Falls back to the resolved provider's catalog when neither
    /// has a key.
    pub fn unified_model_list(&self) -> Vec<ModelDescriptor> {
        let mut models = Vec::new();
        for family in [ProviderFamily::PRIMARY, ProviderFamily::SECONDARY] {
            if self.has_credential(family) {
                models.extend(self.default_model_catalog(family));
            }
        }
        if models.is_empty()
            && let Some((family, _)) = self.credentials.resolution_order().first()
        {
            models.extend(self.default_model_catalog(*family));
        }
        models
    }

    /// Status of the OpenRouter and Groq providers.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        [ProviderAdapter::OpenRouter, ProviderAdapter::Groq]
            .into_iter()
            .map(|adapter| {
                let available = self.credentials.key_for(adapter).is_some();
                ProviderStatus {
                    id: adapter.family(),
                    name: adapter.name(),
                    available,
                    models: if available {
                        adapter.default_models()
                    } else {
                        Vec::new()
                    },
                    capabilities: adapter.capabilities(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted backends shared by the use case tests.

    use super::*;
    use crate::ports::llm_gateway::ChatRequest;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// How a scripted backend answers one model id
    #[derive(Clone)]
    pub enum Reply {
        Text(String),
        Fail(String),
        Panic,
    }

    /// Backend answering by model id; unknown models fail.
    ///
    /// Content rules are checked first: the first rule whose needle appears
    /// in any message of the request decides the reply.
    pub struct ScriptedBackend {
        adapter: ProviderAdapter,
        replies: HashMap<String, Reply>,
        content_rules: Vec<(String, Reply)>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(adapter: ProviderAdapter) -> Self {
            Self {
                adapter,
                replies: HashMap::new(),
                content_rules: Vec::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn reply_when(mut self, needle: &str, text: &str) -> Self {
            self.content_rules
                .push((needle.to_string(), Reply::Text(text.to_string())));
            self
        }

        pub fn fail_when(mut self, needle: &str, error: &str) -> Self {
            self.content_rules
                .push((needle.to_string(), Reply::Fail(error.to_string())));
            self
        }

        pub fn reply(mut self, model: &str, text: &str) -> Self {
            self.replies.insert(model.to_string(), Reply::Text(text.to_string()));
            self
        }

        pub fn fail(mut self, model: &str, error: &str) -> Self {
            self.replies.insert(model.to_string(), Reply::Fail(error.to_string()));
            self
        }

        pub fn panic_on(mut self, model: &str) -> Self {
            self.replies.insert(model.to_string(), Reply::Panic);
            self
        }

        pub fn request_models(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.model.clone())
                .collect()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        fn adapter(&self) -> ProviderAdapter {
            self.adapter
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            let by_content = self.content_rules.iter().find_map(|(needle, reply)| {
                request
                    .messages
                    .iter()
                    .any(|m| m.content.contains(needle.as_str()))
                    .then_some(reply)
            });
            match by_content.or_else(|| self.replies.get(&request.model)) {
                Some(Reply::Text(text)) => Ok(text.clone()),
                Some(Reply::Fail(error)) => Err(GatewayError::RequestFailed(error.clone())),
                Some(Reply::Panic) => panic!("scripted panic for {}", request.model),
                None => Err(GatewayError::ModelNotAvailable(request.model.clone())),
            }
        }
    }

    /// Factory handing out one pre-built backend per adapter.
    #[derive(Default)]
    pub struct ScriptedFactory {
        backends: HashMap<ProviderAdapter, Arc<ScriptedBackend>>,
        pub keys: Mutex<Vec<(ProviderAdapter, String)>>,
    }

    impl ScriptedFactory {
        pub fn with(mut self, backend: ScriptedBackend) -> Self {
            self.backends.insert(backend.adapter, Arc::new(backend));
            self
        }

        pub fn backend(&self, adapter: ProviderAdapter) -> Arc<ScriptedBackend> {
            Arc::clone(&self.backends[&adapter])
        }
    }

    impl BackendFactory for ScriptedFactory {
        fn get_client(
            &self,
            adapter: ProviderAdapter,
            api_key: &str,
        ) -> Result<Arc<dyn LlmBackend>, GatewayError> {
            self.keys.lock().unwrap().push((adapter, api_key.to_string()));
            self.backends
                .get(&adapter)
                .map(|b| Arc::clone(b) as Arc<dyn LlmBackend>)
                .ok_or_else(|| GatewayError::Other(format!("no scripted backend for {adapter}")))
        }
    }

    pub fn openrouter_only() -> Credentials {
        Credentials {
            openrouter_key: Some("or-key".into()),
            ..Default::default()
        }
    }
}
