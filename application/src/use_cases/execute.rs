//! Parallel execution stage
//!
//! Fans the locked prompt out to the selected models concurrently. Every
//! call is awaited and a failed call turns into an error-bearing response,
//! so the output always has one entry per selected model, in selection
//! order.

use crate::ports::llm_gateway::{ChatRequest, GatewayError};
use crate::ports::progress::PipelineObserver;
use crate::registry::ProviderRegistry;
use council_domain::{
    LockedContext, ModelDescriptor, ModelResponse, PromptTemplate, ProviderAdapter, Stage,
    StageEvent,
};
use futures::future::join_all;
use tracing::{info, warn};

pub const MIN_MODEL_COUNT: usize = 1;
pub const MAX_MODEL_COUNT: usize = 4;
pub const DEFAULT_MODEL_COUNT: usize = MAX_MODEL_COUNT;

/// Completion budget for each model answer
pub const EXECUTION_MAX_TOKENS: u32 = 2048;

/// Clamp a requested model count into `1..=4`.
pub fn clamp_model_count(requested: usize) -> usize {
    requested.clamp(MIN_MODEL_COUNT, MAX_MODEL_COUNT)
}

pub struct ParallelExecutor<'a> {
    registry: &'a ProviderRegistry,
    observer: &'a dyn PipelineObserver,
}

impl<'a> ParallelExecutor<'a> {
    pub fn new(registry: &'a ProviderRegistry, observer: &'a dyn PipelineObserver) -> Self {
        Self { registry, observer }
    }

    /// The first `model_count` (clamped) entries of the unified model list.
    pub fn select_models(&self, model_count: usize) -> Vec<ModelDescriptor> {
        self.registry
            .unified_model_list()
            .into_iter()
            .take(clamp_model_count(model_count))
            .collect()
    }

    /// Query every model concurrently and return responses in input order.
    ///
    /// With no models, returns the single synthetic "no backends" response.
    pub async fn execute(
        &self,
        context: &LockedContext,
        models: &[ModelDescriptor],
    ) -> Vec<ModelResponse> {
        if models.is_empty() {
            warn!("No backends configured");
            return vec![ModelResponse::no_backends()];
        }

        let prompt = PromptTemplate::execution_prompt(context);
        join_all(models.iter().map(|model| self.call_model(model, &prompt))).await
    }

    async fn call_model(&self, model: &ModelDescriptor, prompt: &str) -> ModelResponse {
        let result = self.send(model, prompt).await;

        let response = match result {
            Ok(text) => {
                info!(model = %model.display_name, "Model responded successfully");
                ModelResponse::success(&model.display_name, text)
            }
            Err(e) => {
                warn!(model = %model.display_name, error = %e, "Model call failed");
                ModelResponse::failure(&model.display_name, model.family.as_str(), e.to_string())
            }
        };

        self.observer.on_event(&StageEvent::TaskCompleted {
            stage: Stage::Execute,
            label: model.display_name.clone(),
            success: response.is_success(),
        });
        response
    }

    async fn send(&self, model: &ModelDescriptor, prompt: &str) -> Result<String, GatewayError> {
        let backend = self
            .registry
            .backend_for(ProviderAdapter::for_family(model.family))?;
        let request = ChatRequest::user(&model.id, prompt).max_tokens(EXECUTION_MAX_TOKENS);
        backend.complete(&request).await
    }
}
