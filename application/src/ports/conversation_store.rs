//! Port for persisting finished runs.
//!
//! A [`ConversationStore`] keeps every completed [`RunState`] under a fresh
//! conversation id so it can be listed and shown again later.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use council_domain::RunState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the conversation store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A persisted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConversation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub state: RunState,
}

/// One line of the history listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Raw query, truncated for display
    pub query: String,
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a run and return its new conversation id.
    async fn save(&self, state: &RunState) -> Result<String, StoreError>;

    /// Load a run by id. Unknown ids yield `Ok(None)`.
    async fn load(&self, id: &str) -> Result<Option<StoredConversation>, StoreError>;

    /// All stored runs, newest first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError>;
}
