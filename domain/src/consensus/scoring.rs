//! Cluster confidence scoring.

use crate::orchestration::value_objects::{ClaimCluster, PeerReview, ScoredCluster};
use std::collections::BTreeMap;

/// Clusters scoring at or above this are treated as high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.6;

const BASE_SCORE: f64 = 0.5;
const STRONG_AGREEMENT_BONUS: f64 = 0.3;
const MODERATE_AGREEMENT_BONUS: f64 = 0.15;
const CONFLICT_PENALTY: f64 = 0.1;
const PEER_REVIEW_WEIGHT: f64 = 0.2;
const MIN_SCORE: f64 = 0.1;
const MAX_SCORE: f64 = 1.0;

/// Score every cluster and sort the result by descending confidence.
///
/// The score starts at 0.5 and moves with the number of supporting models,
/// the number of conflicting models and, when reviews exist, the average
/// peer-review score of the supporting models. It is clamped to 0.1..=1.0
/// and rounded to two decimals. Ties keep their input order.
pub fn score_clusters(clusters: Vec<ClaimCluster>, reviews: &[PeerReview]) -> Vec<ScoredCluster> {
    let peer_scores = scores_by_reviewed_model(reviews);

    let mut scored: Vec<ScoredCluster> = clusters
        .into_iter()
        .map(|cluster| score_cluster(cluster, &peer_scores))
        .collect();

    scored.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));
    scored
}

fn score_cluster(cluster: ClaimCluster, peer_scores: &BTreeMap<&str, Vec<f64>>) -> ScoredCluster {
    let mut reasons = Vec::new();
    let mut score = BASE_SCORE;

    let support = cluster.supporting_models.len();
    if support >= 3 {
        score += STRONG_AGREEMENT_BONUS;
        reasons.push(format!("Strong agreement: {} models support this", support));
    } else if support == 2 {
        score += MODERATE_AGREEMENT_BONUS;
        reasons.push(format!("Moderate agreement: {} models support this", support));
    } else {
        reasons.push("Single model claim - lower confidence".to_string());
    }

    let conflicts = cluster.conflicting_models.len();
    if conflicts > 0 {
        score -= CONFLICT_PENALTY * conflicts as f64;
        reasons.push(format!("Conflict detected: {} models disagree", conflicts));
    }

    // Model names differ between the executor and reviewers, so match loosely.
    let relevant: Vec<f64> = cluster
        .supporting_models
        .iter()
        .flat_map(|model| {
            peer_scores
                .iter()
                .filter(move |(reviewed, _)| model.contains(*reviewed) || reviewed.contains(model.as_str()))
                .flat_map(|(_, scores)| scores.iter().copied())
        })
        .collect();

    if !relevant.is_empty() {
        let normalized = relevant.iter().sum::<f64>() / relevant.len() as f64 / 10.0;
        score += normalized * PEER_REVIEW_WEIGHT;
        reasons.push(format!("Peer review average: {:.1}/10", normalized * 10.0));
    }

    ScoredCluster {
        cluster,
        confidence_score: round2(score.clamp(MIN_SCORE, MAX_SCORE)),
        reasons,
    }
}

fn scores_by_reviewed_model(reviews: &[PeerReview]) -> BTreeMap<&str, Vec<f64>> {
    let mut by_model: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for review in reviews.iter().filter(|r| !r.reviewed_model.trim().is_empty()) {
        by_model
            .entry(review.reviewed_model.as_str())
            .or_default()
            .push(review.average_score());
    }
    by_model
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
