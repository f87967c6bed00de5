//! Output format value object

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a finished run is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Answer, confidence, recommendations, uncertain areas and the trace
    #[default]
    Full,
    /// Only the final answer text
    Answer,
    /// The whole run state as JSON
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Full => "full",
            OutputFormat::Answer => "answer",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(OutputFormat::Full),
            "answer" => Ok(OutputFormat::Answer),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (full, answer, json)", other)),
        }
    }
}
