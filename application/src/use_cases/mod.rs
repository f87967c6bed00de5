//! Use cases
//!
//! One module per pipeline stage that talks to a backend, plus the
//! orchestrator that runs them all in order.

pub mod execute;
pub mod extract_claims;
pub mod normalize;
pub mod peer_review;
pub mod run_consensus;
pub mod synthesize;
