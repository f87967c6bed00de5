//! Orchestration domain - the run state machine and its stage outputs.
//!
//! - [`entities::Stage`] - the fixed pipeline stage sequence
//! - [`entities::RunState`] - the aggregate root accumulated during a run
//! - [`value_objects`] - immutable outputs of each stage
//! - [`outcome::Outcome`] - success vs. graceful fallback for a single call
//! - [`event::StageEvent`] - structured stage-transition events

pub mod entities;
pub mod event;
pub mod outcome;
pub mod value_objects;
