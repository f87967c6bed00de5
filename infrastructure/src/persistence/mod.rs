//! Conversation persistence adapters.

mod json_store;

pub use json_store::{JsonFileConversationStore, SUMMARY_QUERY_CHARS};
