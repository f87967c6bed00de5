//! Final synthesis stage
//!
//! The chairman model merges the scored clusters and raw responses into one
//! answer. Any failure yields the fixed "synthesis failed" consensus.

use crate::ports::llm_gateway::ChatRequest;
use crate::registry::ResolvedProvider;
use council_domain::consensus::parsing::parse_chairman_verdict;
use council_domain::consensus::scoring::round2;
use council_domain::{
    FinalConsensus, HIGH_CONFIDENCE_THRESHOLD, LockedContext, ModelResponse, Outcome,
    PromptTemplate, ScoredCluster, TraceEntry,
};
use tracing::{info, warn};

/// Confidence reported when there are no clusters to average
pub const NO_CLUSTER_CONFIDENCE: f64 = 0.5;

/// Mean cluster confidence, rounded to two decimals.
pub fn consensus_confidence(scored: &[ScoredCluster]) -> f64 {
    if scored.is_empty() {
        return NO_CLUSTER_CONFIDENCE;
    }
    let total: f64 = scored.iter().map(|s| s.confidence_score).sum();
    round2(total / scored.len() as f64)
}

pub struct Synthesizer<'a> {
    provider: Option<&'a ResolvedProvider>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(provider: Option<&'a ResolvedProvider>) -> Self {
        Self { provider }
    }

    /// Ask the chairman for the final answer.
    ///
    /// `trace` holds the stage summaries recorded so far; a synthesis entry
    /// is appended to it on success.
    pub async fn synthesize(
        &self,
        context: &LockedContext,
        scored: &[ScoredCluster],
        responses: &[ModelResponse],
        trace: Vec<TraceEntry>,
    ) -> Outcome<FinalConsensus> {
        let Some(provider) = self.provider else {
            return Outcome::fallback(FinalConsensus::synthesis_failed(), "no provider configured");
        };

        let (high, uncertain): (Vec<&ScoredCluster>, Vec<&ScoredCluster>) = scored
            .iter()
            .partition(|s| s.confidence_score >= HIGH_CONFIDENCE_THRESHOLD);

        let model = provider.chairman_model();
        let prompt = PromptTemplate::chairman_prompt(context, &high, &uncertain, responses);
        let request = ChatRequest::user(&model, prompt).json();

        let text = match provider.backend.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(model = %model, error = %e, "Synthesis failed");
                return Outcome::fallback(FinalConsensus::synthesis_failed(), e.to_string());
            }
        };

        let Some(verdict) = parse_chairman_verdict(&text) else {
            warn!(model = %model, "Chairman returned unusable JSON");
            return Outcome::fallback(
                FinalConsensus::synthesis_failed(),
                "malformed chairman output",
            );
        };

        info!(model = %model, "Chairman synthesized answer");

        let mut uncertain_areas = verdict.uncertain_areas;
        uncertain_areas.extend(uncertain.iter().map(|s| s.cluster.canonical_label.clone()));

        let mut reasoning_trace = trace;
        reasoning_trace.push(TraceEntry::new(
            "synthesis",
            format!("Chairman ({}) synthesized answer", model),
        ));

        Outcome::Success(FinalConsensus {
            final_answer: verdict.final_answer,
            confidence: consensus_confidence(scored),
            key_recommendations: verdict.key_recommendations,
            uncertain_areas,
            reasoning_trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderRegistry;
    use crate::registry::test_support::*;
    use council_domain::{ClaimCluster, NormalizedQuery, ProviderAdapter, lock_constraints};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn context() -> LockedContext {
        lock_constraints(NormalizedQuery::fallback("Build a React app"))
    }

    fn scored(label: &str, score: f64) -> ScoredCluster {
        ScoredCluster {
            cluster: ClaimCluster {
                cluster_id: "00000000".into(),
                topic: label.to_lowercase(),
                canonical_label: format!("Topic: {label}"),
                claims: vec![],
                supporting_models: BTreeSet::new(),
                conflicting_models: BTreeSet::new(),
            },
            confidence_score: score,
            reasons: vec![],
        }
    }

    fn resolved(backend: ScriptedBackend) -> ResolvedProvider {
        let factory = Arc::new(ScriptedFactory::default().with(backend));
        ProviderRegistry::new(openrouter_only(), factory)
            .resolve(None)
            .unwrap()
    }

    #[test]
    fn test_consensus_confidence() {
        assert_eq!(consensus_confidence(&[]), 0.5);
        assert_eq!(
            consensus_confidence(&[scored("Frontend", 0.8), scored("General", 0.6)]),
            0.7
        );
    }

    #[tokio::test]
    async fn test_no_provider_returns_fixed_fallback() {
        let outcome = Synthesizer::new(None)
            .synthesize(&context(), &[], &[], vec![])
            .await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_value(), FinalConsensus::synthesis_failed());
    }

    #[tokio::test]
    async fn test_chairman_answer_is_merged() {
        let provider = resolved(ScriptedBackend::new(ProviderAdapter::OpenRouter).reply(
            "openai/gpt-4o",
            r#"{"final_answer": "Use React with Vite.", "key_recommendations": ["Use TypeScript"], "uncertain_areas": ["State management"]}"#,
        ));
        let clusters = [scored("Frontend", 0.8), scored("General", 0.5)];
        let trace = vec![TraceEntry::new("normalization", "Intent: build_app")];
        let consensus = Synthesizer::new(Some(&provider))
            .synthesize(&context(), &clusters, &[], trace)
            .await
            .into_value();

        assert_eq!(consensus.final_answer, "Use React with Vite.");
        assert_eq!(consensus.confidence, 0.65);
        assert_eq!(consensus.key_recommendations, vec!["Use TypeScript"]);
        assert_eq!(
            consensus.uncertain_areas,
            vec!["State management".to_string(), "Topic: General".to_string()]
        );
        let steps: Vec<_> = consensus.reasoning_trace.iter().map(|t| t.step.as_str()).collect();
        assert_eq!(steps, vec!["normalization", "synthesis"]);
        assert!(consensus.reasoning_trace[1].details.contains("openai/gpt-4o"));
    }

    #[tokio::test]
    async fn test_chairman_failure_falls_back() {
        let provider = resolved(ScriptedBackend::new(ProviderAdapter::OpenRouter).reply("openai/gpt-4o", "{}"));
        let outcome = Synthesizer::new(Some(&provider))
            .synthesize(&context(), &[scored("Frontend", 0.8)], &[], vec![])
            .await;
        assert_eq!(outcome.cause(), Some("malformed chairman output"));
        assert_eq!(outcome.value().confidence, 0.3);
    }
}
