//! Structured stage-transition events emitted during a run.

use super::entities::Stage;
use serde::Serialize;

/// Progress event sent to the pipeline observer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEvent {
    /// A stage began; `total_tasks` is its fan-out width (1 for single calls)
    StageStarted { stage: Stage, total_tasks: usize },
    /// One call inside a fan-out finished
    TaskCompleted {
        stage: Stage,
        label: String,
        success: bool,
    },
    /// A stage finished and recorded its output
    StageCompleted { stage: Stage, summary: String },
    /// Every stage ran
    RunCompleted { conversation_id: Option<String> },
    /// A pipeline-fatal error stopped the run during `stage`
    RunAborted { stage: Stage, error: String },
}

impl StageEvent {
    /// Event type identifier, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            StageEvent::StageStarted { .. } => "stage_started",
            StageEvent::TaskCompleted { .. } => "task_completed",
            StageEvent::StageCompleted { .. } => "stage_completed",
            StageEvent::RunCompleted { .. } => "run_completed",
            StageEvent::RunAborted { .. } => "run_aborted",
        }
    }

    /// The stage this event belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            StageEvent::StageStarted { stage, .. }
            | StageEvent::TaskCompleted { stage, .. }
            | StageEvent::StageCompleted { stage, .. }
            | StageEvent::RunAborted { stage, .. } => Some(*stage),
            StageEvent::RunCompleted { .. } => None,
        }
    }
}
