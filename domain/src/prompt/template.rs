//! Prompt templates for the council stages

use crate::orchestration::value_objects::{LockedContext, ModelResponse, ScoredCluster};
use crate::util::take_chars;
use serde_json::json;

/// Characters of each response shown to peer reviewers
pub const REVIEW_EXCERPT_CHARS: usize = 2000;
/// Characters of each response shown to the chairman
pub const CHAIRMAN_EXCERPT_CHARS: usize = 500;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the Normalize stage
    pub fn normalizer_system() -> &'static str {
        r#"You are a prompt analyzer. Given a user query, extract:
1. intent: The main goal (e.g., "build_app", "explain_concept", "compare_options", "debug_code", "generate_code")
2. domain: The subject area (e.g., "web_dev", "machine_learning", "databases", "devops")
3. explicit_constraints: Constraints explicitly stated by the user (as JSON object)
4. inferred_constraints: Reasonable defaults to infer (as JSON object)
5. normalized_prompt: A clean, unambiguous rewrite of the query

Respond ONLY with valid JSON in this exact format:
{
  "intent": "string",
  "domain": "string",
  "explicit_constraints": {},
  "inferred_constraints": {},
  "normalized_prompt": "string"
}"#
    }

    /// System prompt for the ExtractClaims stage
    pub fn extraction_system() -> &'static str {
        r#"Extract atomic, testable claims from the following text.
Each claim should be:
- A single, standalone statement
- Verifiable or falsifiable
- Free of subjective language
- Split compound statements (with 'and', 'but', 'because') into separate claims

Respond with a JSON array of strings:
["claim 1", "claim 2", ...]"#
    }

    /// Prompt sent to every model in the Execute stage
    pub fn execution_prompt(context: &LockedContext) -> String {
        format!(
            "{}\n\nConstraints: {}",
            context.normalized_query.normalized_text,
            context.constraints_json()
        )
    }

    /// Prompt for one peer reviewer.
    ///
    /// # Arguments
    /// * `context` - Locked context of the run
    /// * `responses` - `(label, response_text)` pairs the reviewer may see
    pub fn review_prompt(context: &LockedContext, responses: &[(String, String)]) -> String {
        let anonymized: Vec<_> = responses
            .iter()
            .map(|(id, text)| json!({"id": id, "text": take_chars(text, REVIEW_EXCERPT_CHARS)}))
            .collect();
        let anonymized = serde_json::to_string_pretty(&anonymized).unwrap_or_else(|_| "[]".into());

        format!(
            r#"You are reviewing responses to this query: "{}"

Constraints: {}

Anonymized responses:
{}

Provide:
1. accuracy_score (1-10)
2. insight_score (1-10)
3. constraint_adherence (1-10)
4. brief_feedback

Respond with JSON:
{{ "reviews": [ {{ "response_id": "Response_A", "accuracy": 8, "insight": 7, "constraint_adherence": 9, "feedback": "..." }} ] }}"#,
            context.normalized_query.normalized_text,
            context.constraints_json(),
            anonymized
        )
    }

    /// Prompt for the chairman in the Synthesize stage
    pub fn chairman_prompt(
        context: &LockedContext,
        high_confidence: &[&ScoredCluster],
        uncertain: &[&ScoredCluster],
        responses: &[ModelResponse],
    ) -> String {
        let excerpts: Vec<String> = responses
            .iter()
            .map(|r| {
                format!(
                    "- {}: {}...",
                    r.model_id,
                    take_chars(&r.response_text, CHAIRMAN_EXCERPT_CHARS)
                )
            })
            .collect();

        format!(
            r#"You are the Chairman of an LLM Council. Your job is to synthesize a final, authoritative answer.

Original Query: {}
Constraints: {}

High-confidence topics:
{}

Uncertain/disputed topics:
{}

Model responses:
{}

Synthesize a comprehensive answer that:
1. Emphasizes high-confidence conclusions
2. Acknowledges uncertainty
3. Follows constraints
4. Is actionable

Respond with JSON:
{{
  "final_answer": "...",
  "key_recommendations": ["..."],
  "uncertain_areas": ["..."]
}}"#,
            context.normalized_query.normalized_text,
            context.constraints_json(),
            topic_list(high_confidence),
            topic_list(uncertain),
            excerpts.join("\n")
        )
    }
}

fn topic_list(clusters: &[&ScoredCluster]) -> String {
    let topics: Vec<_> = clusters
        .iter()
        .map(|s| json!({"topic": s.cluster.canonical_label, "confidence": s.confidence_score}))
        .collect();
    serde_json::to_string_pretty(&topics).unwrap_or_else(|_| "[]".into())
}
