//! Raw query value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// The original user text for a council run (Value Object)
///
/// Immutable once the run starts. Validation (non-empty) happens at
/// construction, so the pipeline never sees an empty query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuery {
    content: String,
}

impl RawQuery {
    /// Create a query, rejecting empty or whitespace-only input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            Err(DomainError::EmptyQuery)
        } else {
            Ok(Self { content })
        }
    }

    /// Get the query text verbatim
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for RawQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
