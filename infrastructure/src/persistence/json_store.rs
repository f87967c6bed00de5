//! JSON-file conversation store.
//!
//! Each saved run becomes `<uuid>.json` holding `{id, timestamp, state}`
//! with an RFC 3339 timestamp. The directory is created on first save.

use async_trait::async_trait;
use chrono::Utc;
use council_application::ports::conversation_store::{
    ConversationStore, ConversationSummary, StoreError, StoredConversation,
};
use council_domain::RunState;
use council_domain::util::take_chars;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Characters of the raw query shown in a history listing
pub const SUMMARY_QUERY_CHARS: usize = 100;

/// Conversation store writing one pretty-printed JSON file per run.
pub struct JsonFileConversationStore {
    dir: PathBuf,
}

impl JsonFileConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `id`, or `None` when `id` is not a conversation id.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        Uuid::parse_str(id)
            .ok()
            .map(|uuid| self.dir.join(format!("{}.json", uuid)))
    }

    async fn read(path: &Path) -> Result<StoredConversation, StoreError> {
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ConversationStore for JsonFileConversationStore {
    async fn save(&self, state: &RunState) -> Result<String, StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let id = Uuid::new_v4().to_string();
        let record = StoredConversation {
            id: id.clone(),
            timestamp: Utc::now(),
            state: state.clone(),
        };
        let path = self.dir.join(format!("{}.json", id));
        fs::write(&path, serde_json::to_vec_pretty(&record)?).await?;

        debug!(id = %id, path = %path.display(), "Conversation saved");
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<StoredConversation>, StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read(&path).await.map(Some)
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        if !fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(record) => summaries.push(ConversationSummary {
                    query: take_chars(record.state.raw_input.content(), SUMMARY_QUERY_CHARS)
                        .to_string(),
                    id: record.id,
                    timestamp: record.timestamp,
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping malformed conversation file");
                }
            }
        }

        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{ModelResponse, RawQuery, RunStatus};

    fn state(query: &str) -> RunState {
        let mut state = RunState::new(RawQuery::try_new(query).unwrap());
        state.model_responses = Some(vec![ModelResponse::no_backends()]);
        state.complete();
        state
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConversationStore::new(dir.path().join("conversations"));

        let id = store.save(&state("Build a React app")).await.unwrap();
        assert!(dir.path().join("conversations").join(format!("{id}.json")).exists());

        let loaded = store.load(&id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.state.status, RunStatus::Completed);
        assert_eq!(loaded.state.raw_input.content(), "Build a React app");
    }

    #[tokio::test]
    async fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConversationStore::new(dir.path());
        let id = store.save(&state("q")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(format!("{id}.json"))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["id"], id.as_str());
        assert_eq!(value["state"]["raw_input"], "q");
        let timestamp = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConversationStore::new(dir.path());
        assert!(store.load(&Uuid::new_v4().to_string()).await.unwrap().is_none());
        assert!(store.load("../../etc/passwd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConversationStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first_and_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConversationStore::new(dir.path());

        let first = store.save(&state("first")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let long_query = "x".repeat(250);
        let second = store.save(&state(&long_query)).await.unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second);
        assert_eq!(list[0].query.chars().count(), SUMMARY_QUERY_CHARS);
        assert_eq!(list[1].id, first);
        assert_eq!(list[1].query, "first");
    }

    #[tokio::test]
    async fn test_list_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConversationStore::new(dir.path());
        store.save(&state("good")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].query, "good");
    }
}
