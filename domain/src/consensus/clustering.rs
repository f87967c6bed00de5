//! Keyword taxonomy clustering of atomic claims.
//!
//! Claims are matched against a fixed topic taxonomy by lower-case substring.
//! A claim may land in several topics; a claim matching none goes to
//! `"general"`. The grouping is deterministic except for the cluster ids.

use crate::orchestration::value_objects::{ClaimCluster, ClaimSet};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Topic taxonomy, in cluster output order.
pub const TOPIC_TAXONOMY: [(&str, &[&str]); 5] = [
    (
        "frontend",
        &["react", "vue", "angular", "frontend", "ui", "css", "html", "browser"],
    ),
    (
        "backend",
        &["node", "python", "backend", "server", "api", "database", "sql", "fastapi"],
    ),
    (
        "deployment",
        &["deploy", "docker", "kubernetes", "cloud", "aws", "azure", "ci/cd"],
    ),
    ("security", &["auth", "security", "token", "encryption", "https"]),
    ("performance", &["fast", "slow", "optimize", "cache", "latency"]),
];

/// Topic for claims that match no taxonomy entry. Always ordered last.
pub const GENERAL_TOPIC: &str = "general";

/// Well-known models checked for disagreement with a topic.
pub const CONFLICT_ROSTER: [&str; 4] = [
    "gpt-4o",
    "claude-3.5-sonnet",
    "gemini-2.0-flash",
    "llama-3.3-70b-groq",
];

/// At most this many conflicting models are recorded per cluster.
const MAX_CONFLICTS_PER_CLUSTER: usize = 1;

const CLUSTER_ID_LEN: usize = 8;

/// Topics of a single claim text, in taxonomy order.
pub fn topics_for(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let topics: Vec<&'static str> = TOPIC_TAXONOMY
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
        .collect();
    if topics.is_empty() {
        vec![GENERAL_TOPIC]
    } else {
        topics
    }
}

/// Group every claim of every claim set into topic clusters.
///
/// `supporting_models` holds the distinct models with a claim in the topic.
/// `conflicting_models` holds at most one roster model that answered in this
/// run but has no claim in the topic.
pub fn cluster_claims(claim_sets: &[ClaimSet]) -> Vec<ClaimCluster> {
    let mut grouped: BTreeMap<usize, (Vec<String>, BTreeSet<String>)> = BTreeMap::new();

    for set in claim_sets {
        for claim in &set.claims {
            for topic in topics_for(&claim.text) {
                let entry = grouped.entry(topic_rank(topic)).or_default();
                entry.0.push(claim.text.clone());
                entry.1.insert(set.model_id.clone());
            }
        }
    }

    let queried: Vec<String> = claim_sets
        .iter()
        .map(|s| normalize_model_name(&s.model_id))
        .collect();

    grouped
        .into_iter()
        .map(|(rank, (claims, supporting_models))| {
            let topic = topic_at(rank);
            let conflicting_models = conflicting_roster_models(&queried, &supporting_models);
            ClaimCluster {
                cluster_id: short_id(),
                topic: topic.to_string(),
                canonical_label: format!("Topic: {}", title_case(topic)),
                claims,
                supporting_models,
                conflicting_models,
            }
        })
        .collect()
}

fn conflicting_roster_models(
    queried: &[String],
    supporting: &BTreeSet<String>,
) -> BTreeSet<String> {
    let supporters: Vec<String> = supporting.iter().map(|m| normalize_model_name(m)).collect();
    CONFLICT_ROSTER
        .iter()
        .filter(|member| queried.iter().any(|q| q.contains(*member)))
        .filter(|member| !supporters.iter().any(|s| s.contains(*member)))
        .take(MAX_CONFLICTS_PER_CLUSTER)
        .map(|member| member.to_string())
        .collect()
}

/// Lower-case and replace whitespace runs with `-`
/// ("Claude 3.5 Sonnet (OR)" -> "claude-3.5-sonnet-(or)").
pub fn normalize_model_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn topic_rank(topic: &str) -> usize {
    TOPIC_TAXONOMY
        .iter()
        .position(|(t, _)| *t == topic)
        .unwrap_or(TOPIC_TAXONOMY.len())
}

fn topic_at(rank: usize) -> &'static str {
    TOPIC_TAXONOMY.get(rank).map_or(GENERAL_TOPIC, |(t, _)| *t)
}

fn title_case(topic: &str) -> String {
    topic
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn short_id() -> String {
    Uuid::new_v4().to_string()[..CLUSTER_ID_LEN].to_string()
}
