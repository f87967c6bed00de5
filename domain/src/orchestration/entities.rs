//! Orchestration domain entities

use super::value_objects::{
    ClaimCluster, ClaimSet, FinalConsensus, LockedContext, ModelResponse, NormalizedQuery,
    PeerReview, ScoredCluster, TraceEntry,
};
use crate::consensus::scoring::HIGH_CONFIDENCE_THRESHOLD;
use crate::core::query::RawQuery;
use serde::{Deserialize, Serialize};

/// Stage of a council run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    LockConstraints,
    Execute,
    ExtractClaims,
    PeerReview,
    Cluster,
    Score,
    Synthesize,
    /// Hand-off to the conversation store
    Persist,
}

impl Stage {
    /// All stages in the fixed order the orchestrator runs them.
    pub const SEQUENCE: [Stage; 9] = [
        Stage::Normalize,
        Stage::LockConstraints,
        Stage::Execute,
        Stage::ExtractClaims,
        Stage::PeerReview,
        Stage::Cluster,
        Stage::Score,
        Stage::Synthesize,
        Stage::Persist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::LockConstraints => "lock_constraints",
            Stage::Execute => "execute",
            Stage::ExtractClaims => "extract_claims",
            Stage::PeerReview => "peer_review",
            Stage::Cluster => "cluster",
            Stage::Score => "score",
            Stage::Synthesize => "synthesize",
            Stage::Persist => "persist",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Normalize => "Normalization",
            Stage::LockConstraints => "Locking Constraints",
            Stage::Execute => "Parallel Execution",
            Stage::ExtractClaims => "Claim Extraction",
            Stage::PeerReview => "Peer Review",
            Stage::Cluster => "Agreement Detection",
            Stage::Score => "Confidence Scoring",
            Stage::Synthesize => "Final Synthesis",
            Stage::Persist => "Saving Conversation",
        }
    }

    /// 1-based position in [`Stage::SEQUENCE`]
    pub fn ordinal(&self) -> usize {
        Stage::SEQUENCE
            .iter()
            .position(|s| s == self)
            .map_or(0, |i| i + 1)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    /// Every stage ran and the result was handed to persistence
    Completed,
    /// A pipeline-fatal error stopped the run early
    Aborted,
}

/// Aggregate root of a council run (Entity)
///
/// Created holding only the raw query; every stage fills in its own field,
/// in order. Nothing is ever rolled back: an aborted run keeps whatever the
/// earlier stages recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub raw_input: RawQuery,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub normalized: Option<NormalizedQuery>,
    pub locked_context: Option<LockedContext>,
    pub model_responses: Option<Vec<ModelResponse>>,
    pub claim_sets: Option<Vec<ClaimSet>>,
    pub peer_reviews: Option<Vec<PeerReview>>,
    pub clusters: Option<Vec<ClaimCluster>>,
    pub scored_clusters: Option<Vec<ScoredCluster>>,
    pub consensus: Option<FinalConsensus>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl RunState {
    pub fn new(raw_input: RawQuery) -> Self {
        Self {
            raw_input,
            status: RunStatus::Running,
            conversation_id: None,
            normalized: None,
            locked_context: None,
            model_responses: None,
            claim_sets: None,
            peer_reviews: None,
            clusters: None,
            scored_clusters: None,
            consensus: None,
            errors: Vec::new(),
        }
    }

    /// Stop the run, keeping everything recorded so far.
    pub fn abort(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.status = RunStatus::Aborted;
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
    }

    pub fn is_aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }

    /// Total number of claims across all claim sets
    pub fn total_claims(&self) -> usize {
        self.claim_sets
            .as_deref()
            .map_or(0, |sets| sets.iter().map(|s| s.claims.len()).sum())
    }

    /// One summary entry per stage that has produced output so far.
    pub fn stage_trace(&self) -> Vec<TraceEntry> {
        let mut trace = Vec::new();
        if let Some(n) = &self.normalized {
            trace.push(TraceEntry::new(
                "normalization",
                format!("Intent: {}, Domain: {}", n.intent, n.domain),
            ));
        }
        if let Some(ctx) = &self.locked_context {
            trace.push(TraceEntry::new(
                "constraints",
                format!(
                    "Locked {} constraints (hash {})",
                    ctx.merged_constraints.len(),
                    ctx.constraint_hash
                ),
            ));
        }
        if let Some(responses) = &self.model_responses {
            trace.push(TraceEntry::new(
                "execution",
                format!("Queried {} models", responses.len()),
            ));
        }
        if self.claim_sets.is_some() {
            trace.push(TraceEntry::new(
                "claims",
                format!("Extracted {} total claims", self.total_claims()),
            ));
        }
        if let Some(reviews) = &self.peer_reviews {
            trace.push(TraceEntry::new(
                "peer_review",
                format!("Collected {} peer reviews", reviews.len()),
            ));
        }
        if let Some(clusters) = &self.clusters {
            trace.push(TraceEntry::new(
                "clustering",
                format!("Found {} claim clusters", clusters.len()),
            ));
        }
        if let Some(scored) = &self.scored_clusters {
            let high = scored
                .iter()
                .filter(|s| s.confidence_score >= HIGH_CONFIDENCE_THRESHOLD)
                .count();
            trace.push(TraceEntry::new(
                "scoring",
                format!("High confidence: {}, Low: {}", high, scored.len() - high),
            ));
        }
        trace
    }
}
