//! Logging infrastructure: structured stage-event logging.
//!
//! Provides [`JsonlStageLogger`], a JSONL file writer that implements
//! the [`PipelineObserver`](council_application::PipelineObserver) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlStageLogger;
