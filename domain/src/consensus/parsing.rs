//! Parsing of structured LLM output.
//!
//! Models are asked for JSON but often wrap it in prose or markdown code
//! fences. Every parser here is lenient about that wrapping and returns
//! `None` when the payload cannot be used, so callers can switch to their
//! fallback value.
//!
//! | Function | Stage | Expected shape |
//! |----------|-------|----------------|
//! | [`parse_normalized_query`] | Normalize | `{intent, domain, explicit_constraints, inferred_constraints, normalized_text}` |
//! | [`parse_claims`] | ExtractClaims | `["claim", ...]` or `{"claims": [...]}` |
//! | [`parse_review_entries`] | PeerReview | `{"reviews": [{response_id, accuracy, insight, constraint_adherence, feedback}]}` |
//! | [`parse_chairman_verdict`] | Synthesize | `{final_answer, key_recommendations, uncertain_areas}` |

use crate::orchestration::value_objects::NormalizedQuery;
use serde::Deserialize;
use serde_json::Value;

/// Maximum number of claims kept from one extraction.
pub const MAX_CLAIMS: usize = 20;
/// Maximum number of sentence fragments kept by [`sentence_claims`].
pub const MAX_SENTENCE_CLAIMS: usize = 10;
/// Fragments must be longer than this to count as a claim.
const MIN_SENTENCE_CHARS: usize = 20;
/// Score used when a review omits an axis.
pub const DEFAULT_REVIEW_SCORE: u8 = 5;

/// Find and parse the JSON payload in a model response.
///
/// Tries the whole text first, then the body of a code fence, then the
/// outermost `{...}` or `[...]` span, whichever opens first.
pub fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(body) = fenced_body(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(body.trim())
    {
        return Some(value);
    }

    let object = trimmed.find('{').map(|i| (i, '}'));
    let array = trimmed.find('[').map(|i| (i, ']'));
    let mut spans: Vec<(usize, char)> = object.into_iter().chain(array).collect();
    spans.sort_by_key(|(start, _)| *start);

    spans.into_iter().find_map(|(start, close)| {
        let end = trimmed.rfind(close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
    })
}

fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip the language tag line ("json", "JSON", ...)
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// Parse the normalizer's answer.
pub fn parse_normalized_query(response: &str) -> Option<NormalizedQuery> {
    let value = extract_json(response)?;
    serde_json::from_value(value).ok()
}

/// Parse claim texts from an extraction answer.
///
/// Accepts a bare array or an object with a `claims` array. Only non-empty
/// string entries are kept, capped at [`MAX_CLAIMS`]. Any other shape is
/// unusable and yields `None`.
pub fn parse_claims(response: &str) -> Option<Vec<String>> {
    let value = extract_json(response)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("claims") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    Some(
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .take(MAX_CLAIMS)
            .collect(),
    )
}

/// Fallback claims: split on `". "` and keep trimmed fragments longer than
/// 20 characters, at most [`MAX_SENTENCE_CLAIMS`].
pub fn sentence_claims(text: &str) -> Vec<String> {
    text.split(". ")
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(MAX_SENTENCE_CLAIMS)
        .map(str::to_string)
        .collect()
}

/// One review item as returned by a reviewer, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    /// Anonymized label, e.g. "Response_A"
    pub response_id: String,
    pub accuracy: u8,
    pub insight: u8,
    pub constraint_adherence: u8,
    pub feedback: String,
}

/// Parse a reviewer's `{"reviews": [...]}` answer.
///
/// Entries without a non-blank `response_id` are skipped. Missing or non-numeric
/// scores default to 5; all scores are clamped to 1..=10.
pub fn parse_review_entries(response: &str) -> Option<Vec<ReviewEntry>> {
    let value = extract_json(response)?;
    let reviews = value.get("reviews")?.as_array()?;

    Some(
        reviews
            .iter()
            .filter_map(|r| {
                let response_id = r
                    .get("response_id")?
                    .as_str()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())?
                    .to_string();
                Some(ReviewEntry {
                    response_id,
                    accuracy: review_score(r.get("accuracy")),
                    insight: review_score(r.get("insight")),
                    constraint_adherence: review_score(r.get("constraint_adherence")),
                    feedback: r
                        .get("feedback")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect(),
    )
}

fn review_score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(score) if score.is_finite() => score.round().clamp(1.0, 10.0) as u8,
        _ => DEFAULT_REVIEW_SCORE,
    }
}

/// The chairman's synthesized answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChairmanVerdict {
    pub final_answer: String,
    #[serde(default)]
    pub key_recommendations: Vec<String>,
    #[serde(default)]
    pub uncertain_areas: Vec<String>,
}

/// Parse the chairman's answer. A missing or blank `final_answer` is unusable.
pub fn parse_chairman_verdict(response: &str) -> Option<ChairmanVerdict> {
    let value = extract_json(response)?;
    let verdict: ChairmanVerdict = serde_json::from_value(value).ok()?;
    if verdict.final_answer.trim().is_empty() {
        return None;
    }
    Some(verdict)
}
