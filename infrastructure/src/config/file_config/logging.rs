//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving every stage event of a run
    pub event_log: Option<PathBuf>,
    /// File receiving tracing output in addition to stderr
    pub log_file: Option<PathBuf>,
}
