//! Infrastructure layer for consensus-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the HTTP chat backend, the JSON-file
//! conversation store, the JSONL event log and configuration file loading.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, ConfigSource, FileConfig, FileOutputConfig,
    FileOutputFormat,
};
pub use logging::JsonlStageLogger;
pub use persistence::JsonFileConversationStore;
pub use providers::{EndpointConfig, HttpBackendFactory, OpenAiCompatBackend, ProviderEndpoints};
