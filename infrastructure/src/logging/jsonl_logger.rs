//! JSONL file writer for stage events.
//!
//! Each [`StageEvent`] is serialized as a single JSON line carrying its
//! `type` tag plus a `timestamp`, appended via a buffered writer.

use council_application::ports::progress::PipelineObserver;
use council_domain::StageEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL stage logger that writes one JSON object per event.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Appends to an existing file so
/// one log can span several runs. Flushes on `Drop`.
pub struct JsonlStageLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlStageLogger {
    /// Create a logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &StageEvent) -> Option<String> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut value = serde_json::to_value(event).ok()?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
        }
        serde_json::to_string(&value).ok()
    }
}

impl PipelineObserver for JsonlStageLogger {
    fn on_event(&self, event: &StageEvent) {
        let Some(line) = Self::record(event) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each line so a crash keeps the log
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlStageLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
