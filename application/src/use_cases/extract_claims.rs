//! Claim extraction stage
//!
//! Decomposes every model response into atomic claims, one utility-model
//! call per response, all concurrent. A failed or unparseable call falls
//! back to sentence splitting; a claim set is never empty.

use crate::ports::llm_gateway::ChatRequest;
use crate::ports::progress::PipelineObserver;
use crate::registry::ResolvedProvider;
use council_domain::consensus::parsing::{parse_claims, sentence_claims};
use council_domain::util::take_chars;
use council_domain::{ClaimSet, ModelResponse, Outcome, PromptTemplate, Stage, StageEvent};
use futures::future::join_all;
use tracing::{debug, warn};

/// Characters of each response sent to the extractor
pub const EXTRACTION_INPUT_CHARS: usize = 4000;

pub struct ClaimExtractor<'a> {
    provider: Option<&'a ResolvedProvider>,
    observer: &'a dyn PipelineObserver,
}

impl<'a> ClaimExtractor<'a> {
    pub fn new(provider: Option<&'a ResolvedProvider>, observer: &'a dyn PipelineObserver) -> Self {
        Self { provider, observer }
    }

    /// One claim set per response, in input order.
    pub async fn extract(&self, responses: &[ModelResponse]) -> Vec<ClaimSet> {
        join_all(responses.iter().map(|r| self.extract_one(r)))
            .await
            .into_iter()
            .map(Outcome::into_value)
            .collect()
    }

    async fn extract_one(&self, response: &ModelResponse) -> Outcome<ClaimSet> {
        let outcome = match self.request_claims(response).await {
            Ok(texts) => Outcome::Success(ClaimSet::from_texts(
                &response.model_id,
                texts,
                &response.response_text,
            )),
            Err(cause) => {
                debug!(model = %response.model_id, cause = %cause, "Falling back to sentence split");
                Outcome::fallback(
                    ClaimSet::from_texts(
                        &response.model_id,
                        sentence_claims(&response.response_text),
                        &response.response_text,
                    ),
                    cause,
                )
            }
        };

        self.observer.on_event(&StageEvent::TaskCompleted {
            stage: Stage::ExtractClaims,
            label: response.model_id.clone(),
            success: !outcome.is_fallback(),
        });
        outcome
    }

    async fn request_claims(&self, response: &ModelResponse) -> Result<Vec<String>, String> {
        let provider = self
            .provider
            .ok_or_else(|| "no provider configured".to_string())?;

        let model = provider.utility_model();
        let request = ChatRequest::with_system(
            model,
            PromptTemplate::extraction_system(),
            take_chars(&response.response_text, EXTRACTION_INPUT_CHARS),
        )
        .json();

        let text = provider.backend.complete(&request).await.map_err(|e| {
            warn!(model = %model, source = %response.model_id, error = %e, "Claim extraction failed");
            e.to_string()
        })?;

        parse_claims(&text).ok_or_else(|| {
            warn!(model = %model, source = %response.model_id, "Claim extraction returned unusable JSON");
            "malformed extraction output".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoObserver;
    use crate::registry::ProviderRegistry;
    use crate::registry::test_support::*;
    use council_domain::ProviderAdapter;
    use std::sync::Arc;

    fn resolved(backend: ScriptedBackend) -> ResolvedProvider {
        let factory = Arc::new(ScriptedFactory::default().with(backend));
        ProviderRegistry::new(openrouter_only(), factory)
            .resolve(None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_no_provider_uses_sentence_split() {
        let responses = vec![ModelResponse::no_backends()];
        let sets = ClaimExtractor::new(None, &NoObserver).extract(&responses).await;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].model_id, "system");
        let texts: Vec<_> = sets[0].claims.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["No API keys configured", "Please configure keys in Settings."]);
    }

    #[tokio::test]
    async fn test_short_response_gets_synthetic_claim() {
        let responses = vec![ModelResponse::success("m1", "Yes.")];
        let sets = ClaimExtractor::new(None, &NoObserver).extract(&responses).await;
        assert_eq!(sets[0].claims.len(), 1);
        assert_eq!(sets[0].claims[0].text, "Yes.");
    }

    #[tokio::test]
    async fn test_parsed_claims_keep_input_order() {
        let provider = resolved(ScriptedBackend::new(ProviderAdapter::OpenRouter).reply(
            "openai/gpt-4o-mini",
            r#"{"claims": ["React is a UI library", "Vite is a build tool"]}"#,
        ));
        let responses = vec![
            ModelResponse::success("first", "React is a UI library and Vite is a build tool"),
            ModelResponse::success("second", "Same here"),
        ];
        let sets = ClaimExtractor::new(Some(&provider), &NoObserver)
            .extract(&responses)
            .await;
        assert_eq!(sets[0].model_id, "first");
        assert_eq!(sets[1].model_id, "second");
        assert_eq!(sets[0].claims.len(), 2);
        assert_eq!(sets[0].claims[1].text, "Vite is a build tool");
    }

    #[derive(Default)]
    struct TaskRecorder(std::sync::Mutex<Vec<(String, bool)>>);

    impl PipelineObserver for TaskRecorder {
        fn on_event(&self, event: &StageEvent) {
            if let StageEvent::TaskCompleted { label, success, .. } = event {
                self.0.lock().unwrap().push((label.clone(), *success));
            }
        }
    }

    #[tokio::test]
    async fn test_one_failed_extraction_leaves_others_intact() {
        let provider = resolved(
            ScriptedBackend::new(ProviderAdapter::OpenRouter)
                .reply_when("Alpha answer", r#"["React suits large single page apps"]"#)
                .fail_when("Beta answer", "HTTP 503")
                .reply_when("Gamma answer", r#"{"claims": ["Vite builds quickly", "Vitest fits Vite"]}"#),
        );
        let responses = vec![
            ModelResponse::success("alpha", "Alpha answer"),
            ModelResponse::success(
                "beta",
                "Beta answer prefers Svelte for small apps. Svelte compiles away the runtime entirely",
            ),
            ModelResponse::success("gamma", "Gamma answer"),
        ];
        let recorder = TaskRecorder::default();
        let sets = ClaimExtractor::new(Some(&provider), &recorder)
            .extract(&responses)
            .await;

        let ids: Vec<_> = sets.iter().map(|s| s.model_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);

        let texts = |i: usize| -> Vec<&str> { sets[i].claims.iter().map(|c| c.text.as_str()).collect() };
        assert_eq!(texts(0), vec!["React suits large single page apps"]);
        assert_eq!(
            texts(1),
            vec![
                "Beta answer prefers Svelte for small apps",
                "Svelte compiles away the runtime entirely"
            ]
        );
        assert_eq!(texts(2), vec!["Vite builds quickly", "Vitest fits Vite"]);

        let tasks = recorder.0.lock().unwrap();
        assert_eq!(tasks.iter().filter(|(_, ok)| !ok).count(), 1);
        assert!(tasks.contains(&("beta".to_string(), false)));
    }

    #[tokio::test]
    async fn test_input_is_truncated() {
        let factory = Arc::new(ScriptedFactory::default().with(
            ScriptedBackend::new(ProviderAdapter::OpenRouter).reply("openai/gpt-4o-mini", r#"["x is y"]"#),
        ));
        let provider = ProviderRegistry::new(openrouter_only(), factory.clone())
            .resolve(None)
            .unwrap();
        let responses = vec![ModelResponse::success("m1", "z".repeat(9000))];
        ClaimExtractor::new(Some(&provider), &NoObserver)
            .extract(&responses)
            .await;
        let backend = factory.backend(ProviderAdapter::OpenRouter);
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].messages[1].content.len(), EXTRACTION_INPUT_CHARS);
        assert!(requests[0].json_mode);
    }

    #[tokio::test]
    async fn test_empty_claim_list_skips_sentence_split() {
        let provider = resolved(
            ScriptedBackend::new(ProviderAdapter::OpenRouter).reply("openai/gpt-4o-mini", r#"{"claims": []}"#),
        );
        let text = format!("React remains the most popular choice. {}", "Vue is gentle. ".repeat(20));
        let responses = vec![ModelResponse::success("m1", text.clone())];
        let sets = ClaimExtractor::new(Some(&provider), &NoObserver)
            .extract(&responses)
            .await;
        assert_eq!(sets[0].claims.len(), 1);
        assert_eq!(sets[0].claims[0].text, take_chars(&text, 200));
    }

    #[tokio::test]
    async fn test_unparseable_output_falls_back() {
        let provider = resolved(
            ScriptedBackend::new(ProviderAdapter::OpenRouter).reply("openai/gpt-4o-mini", "I cannot do that"),
        );
        let text = "React remains the most popular choice. Vue offers a gentler learning curve";
        let responses = vec![ModelResponse::success("m1", text)];
        let sets = ClaimExtractor::new(Some(&provider), &NoObserver)
            .extract(&responses)
            .await;
        assert_eq!(sets[0].claims.len(), 2);
    }
}
