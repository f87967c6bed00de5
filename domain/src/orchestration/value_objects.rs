//! Orchestration value objects - immutable result types for council runs.
//!
//! These types represent the outputs of each pipeline stage:
//! - [`NormalizedQuery`] - intent, domain and constraints of the raw query
//! - [`LockedContext`] - merged constraints behind a stable hash
//! - [`ModelResponse`] - one backend's answer from the Execute stage
//! - [`ClaimSet`] - atomic claims decomposed from one response
//! - [`PeerReview`] - one model's scores for another model's answer
//! - [`ClaimCluster`] / [`ScoredCluster`] - topic clusters and their confidence
//! - [`FinalConsensus`] - the chairman's synthesized answer

use crate::util::{take_chars, word_count};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Constraint key/value map. Keys are kept sorted.
pub type ConstraintMap = BTreeMap<String, Value>;

/// Model id used for the synthetic response when no backend is configured.
pub const SYSTEM_MODEL_ID: &str = "system";

/// Response text used when no backend is configured.
pub const NO_BACKENDS_MESSAGE: &str = "No API keys configured. Please configure keys in Settings.";

/// Length of the synthetic claim cut from a raw response.
const SYNTHETIC_CLAIM_CHARS: usize = 200;

/// Output of the Normalize stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub intent: String,
    pub domain: String,
    #[serde(default)]
    pub explicit_constraints: ConstraintMap,
    #[serde(default)]
    pub inferred_constraints: ConstraintMap,
    #[serde(alias = "normalized_prompt")]
    pub normalized_text: String,
}

impl NormalizedQuery {
    /// Deterministic result used whenever the normalizer call cannot be made
    /// or returns something unusable.
    pub fn fallback(raw_input: &str) -> Self {
        let mut inferred = ConstraintMap::new();
        inferred.insert("language".to_string(), Value::from("english"));
        inferred.insert("depth".to_string(), Value::from("intermediate"));
        Self {
            intent: "general_query".to_string(),
            domain: "technology".to_string(),
            explicit_constraints: ConstraintMap::new(),
            inferred_constraints: inferred,
            normalized_text: raw_input.to_string(),
        }
    }
}

/// Output of the LockConstraints stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedContext {
    pub merged_constraints: ConstraintMap,
    /// 12 lowercase hex characters
    pub constraint_hash: String,
    pub normalized_query: NormalizedQuery,
}

impl LockedContext {
    /// Merged constraints as compact JSON, for embedding in prompts.
    pub fn constraints_json(&self) -> String {
        serde_json::to_string(&self.merged_constraints).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Response from a single backend in the Execute stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Display name of the model that answered
    pub model_id: String,
    pub response_text: String,
    /// Word count of `response_text`; 0 for converted failures
    pub token_count: usize,
    /// Failure description when the call was converted into a response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResponse {
    /// Creates a successful response, counting words as tokens.
    pub fn success(model_id: impl Into<String>, text: impl Into<String>) -> Self {
        let response_text = text.into();
        Self {
            model_id: model_id.into(),
            token_count: word_count(&response_text),
            response_text,
            error: None,
        }
    }

    /// Creates an error-bearing response in place of a failed call.
    ///
    /// # Arguments
    /// * `model_id` - Display name of the model that failed
    /// * `provider` - Provider label shown in the error text
    /// * `error` - Description of the failure
    pub fn failure(
        model_id: impl Into<String>,
        provider: &str,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            model_id: model_id.into(),
            response_text: format!("Error ({}): {}", provider, error),
            token_count: 0,
            error: Some(error),
        }
    }

    /// The single synthetic response returned when no backend is configured.
    pub fn no_backends() -> Self {
        Self {
            model_id: SYSTEM_MODEL_ID.to_string(),
            response_text: NO_BACKENDS_MESSAGE.to_string(),
            token_count: 0,
            error: None,
        }
    }

    /// Returns `true` unless this response stands in for a failed call.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A single standalone, checkable statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicClaim {
    pub claim_id: String,
    pub text: String,
}

impl AtomicClaim {
    /// Creates a claim with a fresh unique id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            claim_id: Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }
}

/// All claims extracted from one model's response. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub model_id: String,
    pub claims: Vec<AtomicClaim>,
}

impl ClaimSet {
    /// Builds a claim set from claim texts.
    ///
    /// When `texts` is empty, a single synthetic claim holding the first
    /// 200 characters of `raw_response` is used instead.
    pub fn from_texts(model_id: impl Into<String>, texts: Vec<String>, raw_response: &str) -> Self {
        let mut claims: Vec<AtomicClaim> = texts.into_iter().map(AtomicClaim::new).collect();
        if claims.is_empty() {
            claims.push(AtomicClaim::new(take_chars(raw_response, SYNTHETIC_CLAIM_CHARS)));
        }
        Self {
            model_id: model_id.into(),
            claims,
        }
    }
}

/// Anonymized review of one model's answer by another model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReview {
    pub reviewer_model: String,
    pub reviewed_model: String,
    /// 1-10
    pub accuracy_score: u8,
    /// 1-10
    pub insight_score: u8,
    /// 1-10
    pub constraint_adherence_score: u8,
    pub feedback_text: String,
}

impl PeerReview {
    /// Mean of the three score axes (1.0 - 10.0).
    pub fn average_score(&self) -> f64 {
        (f64::from(self.accuracy_score)
            + f64::from(self.insight_score)
            + f64::from(self.constraint_adherence_score))
            / 3.0
    }
}

/// Topic cluster of claims with the models backing or contradicting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCluster {
    pub cluster_id: String,
    /// Taxonomy key, e.g. "frontend" or "general"
    pub topic: String,
    /// Human-readable label, e.g. "Topic: Frontend"
    pub canonical_label: String,
    /// Texts of the claims that matched this topic
    #[serde(default)]
    pub claims: Vec<String>,
    pub supporting_models: BTreeSet<String>,
    pub conflicting_models: BTreeSet<String>,
}

/// A cluster with its confidence score and the reasons behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCluster {
    #[serde(flatten)]
    pub cluster: ClaimCluster,
    /// 0.1 - 1.0, two decimals
    pub confidence_score: f64,
    pub reasons: Vec<String>,
}

/// One stage summary in the consensus reasoning trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub step: String,
    pub details: String,
}

impl TraceEntry {
    pub fn new(step: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            details: details.into(),
        }
    }
}

/// Final synthesized answer of the council
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalConsensus {
    pub final_answer: String,
    /// Mean cluster confidence (0.0 - 1.0)
    pub confidence: f64,
    #[serde(default)]
    pub key_recommendations: Vec<String>,
    pub uncertain_areas: Vec<String>,
    pub reasoning_trace: Vec<TraceEntry>,
}

impl FinalConsensus {
    /// Fixed, always well-formed result used when synthesis fails.
    pub fn synthesis_failed() -> Self {
        Self {
            final_answer: "The council was unable to reach a synthesis. Please review individual model responses.".to_string(),
            confidence: 0.3,
            key_recommendations: Vec::new(),
            uncertain_areas: vec!["Synthesis failed".to_string()],
            reasoning_trace: vec![TraceEntry::new("error", "Synthesis failed")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_normalization_keeps_raw_text() {
        let n = NormalizedQuery::fallback("Build a React app");
        assert_eq!(n.intent, "general_query");
        assert_eq!(n.domain, "technology");
        assert!(n.explicit_constraints.is_empty());
        assert_eq!(n.inferred_constraints["language"], "english");
        assert_eq!(n.inferred_constraints["depth"], "intermediate");
        assert_eq!(n.normalized_text, "Build a React app");
    }

    #[test]
    fn test_normalized_query_accepts_prompt_alias() {
        let json = r#"{"intent":"build_app","domain":"web_dev","explicit_constraints":{},"inferred_constraints":{},"normalized_prompt":"Build it"}"#;
        let n: NormalizedQuery = serde_json::from_str(json).unwrap();
        assert_eq!(n.normalized_text, "Build it");
    }

    #[test]
    fn test_success_counts_words() {
        let r = ModelResponse::success("GPT-4o (OR)", "Use React with Vite");
        assert_eq!(r.token_count, 4);
        assert!(r.is_success());
    }

    #[test]
    fn test_failure_carries_error_marker() {
        let r = ModelResponse::failure("Llama 3.3 70B", "groq", "connection refused");
        assert_eq!(r.token_count, 0);
        assert!(r.response_text.starts_with("Error (groq):"));
        assert!(!r.is_success());
    }

    #[test]
    fn test_no_backends_response() {
        let r = ModelResponse::no_backends();
        assert_eq!(r.model_id, "system");
        assert_eq!(r.token_count, 0);
        assert!(r.response_text.starts_with("No API keys configured"));
    }

    #[test]
    fn test_claim_set_never_empty() {
        let raw = "x".repeat(500);
        let set = ClaimSet::from_texts("m", vec![], &raw);
        assert_eq!(set.claims.len(), 1);
        assert_eq!(set.claims[0].text.len(), 200);
    }

    #[test]
    fn test_claim_ids_are_unique() {
        let set = ClaimSet::from_texts("m", vec!["a".into(), "a".into()], "");
        assert_ne!(set.claims[0].claim_id, set.claims[1].claim_id);
    }

    #[test]
    fn test_peer_review_average() {
        let review = PeerReview {
            reviewer_model: "a".into(),
            reviewed_model: "b".into(),
            accuracy_score: 8,
            insight_score: 7,
            constraint_adherence_score: 9,
            feedback_text: String::new(),
        };
        assert!((review.average_score() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_synthesis_failed_is_well_formed() {
        let c = FinalConsensus::synthesis_failed();
        assert!(!c.final_answer.is_empty());
        assert_eq!(c.confidence, 0.3);
        assert_eq!(c.uncertain_areas, vec!["Synthesis failed".to_string()]);
        assert_eq!(c.reasoning_trace.len(), 1);
    }

    #[test]
    fn test_scored_cluster_flattens_cluster_fields() {
        let scored = ScoredCluster {
            cluster: ClaimCluster {
                cluster_id: "abcd1234".into(),
                topic: "frontend".into(),
                canonical_label: "Topic: Frontend".into(),
                claims: vec![],
                supporting_models: BTreeSet::new(),
                conflicting_models: BTreeSet::new(),
            },
            confidence_score: 0.5,
            reasons: vec![],
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["canonical_label"], "Topic: Frontend");
        assert_eq!(value["confidence_score"], 0.5);
    }
}
