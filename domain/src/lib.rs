//! Domain layer for consensus-council
//!
//! This crate contains the run data model and the deterministic parts of the
//! consensus pipeline. It has no dependencies on infrastructure or presentation
//! concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Council run
//!
//! A raw query is normalized, its constraints are locked behind a hash, and
//! several models answer it. Each answer is decomposed into atomic claims,
//! models review each other anonymously, claims are clustered by topic and
//! every cluster gets a confidence score before a chairman model writes the
//! final answer.
//!
//! ## Pure stages
//!
//! - [`consensus::constraints`] - constraint merge and hash
//! - [`consensus::clustering`] - keyword taxonomy clustering
//! - [`consensus::scoring`] - cluster confidence scoring

pub mod config;
pub mod consensus;
pub mod core;
pub mod orchestration;
pub mod prompt;
pub mod providers;
pub mod util;

// Re-export commonly used types
pub use consensus::{
    clustering::{cluster_claims, TOPIC_TAXONOMY},
    constraints::{constraint_hash, lock_constraints, merge_constraints},
    scoring::{score_clusters, HIGH_CONFIDENCE_THRESHOLD},
};
pub use config::OutputFormat;
pub use core::{error::DomainError, query::RawQuery};
pub use orchestration::{
    entities::{RunState, RunStatus, Stage},
    event::StageEvent,
    outcome::Outcome,
    value_objects::{
        AtomicClaim, ClaimCluster, ClaimSet, ConstraintMap, FinalConsensus, LockedContext,
        ModelResponse, NormalizedQuery, PeerReview, ScoredCluster, TraceEntry,
    },
};
pub use prompt::PromptTemplate;
pub use providers::{
    Capability, ModelDescriptor, ProviderAdapter, ProviderFamily, detection::detect_family,
};
