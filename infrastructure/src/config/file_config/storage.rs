//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_DIR: &str = "consensus-council";
const CONVERSATIONS_DIR: &str = "conversations";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Directory holding one JSON file per saved run
    pub dir: Option<PathBuf>,
}

impl FileStorageConfig {
    /// `dir`, or `<data_dir>/consensus-council/conversations`.
    ///
    /// Falls back to `./.consensus-council/conversations` on platforms
    /// without a data directory.
    pub fn conversations_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR)))
            .join(CONVERSATIONS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let config = FileStorageConfig {
            dir: Some(PathBuf::from("/tmp/council")),
        };
        assert_eq!(config.conversations_dir(), PathBuf::from("/tmp/council"));
    }

    #[test]
    fn test_default_dir_ends_with_conversations() {
        let dir = FileStorageConfig::default().conversations_dir();
        assert!(dir.ends_with("consensus-council/conversations"));
    }
}
