//! Run configuration from TOML (`[run]` section)

use council_application::{DEFAULT_MODEL_COUNT, MAX_MODEL_COUNT, MIN_MODEL_COUNT};
use council_domain::ProviderFamily;
use serde::{Deserialize, Serialize};

/// Raw run configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRunConfig {
    /// Number of models queried in parallel (1-4)
    pub model_count: usize,
    /// Persist finished runs to the conversation store
    pub save: bool,
    /// Provider used for normalization, extraction, review and synthesis
    pub preferred_provider: Option<String>,
}

impl Default for FileRunConfig {
    fn default() -> Self {
        Self {
            model_count: DEFAULT_MODEL_COUNT,
            save: true,
            preferred_provider: None,
        }
    }
}

impl FileRunConfig {
    pub fn model_count_in_range(&self) -> bool {
        (MIN_MODEL_COUNT..=MAX_MODEL_COUNT).contains(&self.model_count)
    }

    /// Parse `preferred_provider`, `None` when unset or unknown.
    pub fn parse_preferred_provider(&self) -> Option<ProviderFamily> {
        self.preferred_provider.as_deref().and_then(|p| p.parse().ok())
    }
}
