//! Query normalization stage
//!
//! One utility-model call that classifies the query and extracts its
//! constraints. Any failure yields the deterministic fallback.

use crate::ports::llm_gateway::ChatRequest;
use crate::registry::ResolvedProvider;
use council_domain::consensus::parsing::parse_normalized_query;
use council_domain::{NormalizedQuery, Outcome, PromptTemplate, RawQuery};
use tracing::{debug, warn};

pub struct QueryNormalizer<'a> {
    provider: Option<&'a ResolvedProvider>,
}

impl<'a> QueryNormalizer<'a> {
    pub fn new(provider: Option<&'a ResolvedProvider>) -> Self {
        Self { provider }
    }

    pub async fn normalize(&self, raw: &RawQuery) -> Outcome<NormalizedQuery> {
        let fallback = || NormalizedQuery::fallback(raw.content());

        let Some(provider) = self.provider else {
            debug!("No provider configured, using fallback normalization");
            return Outcome::fallback(fallback(), "no provider configured");
        };

        let model = provider.utility_model();
        let request = ChatRequest::with_system(
            model,
            PromptTemplate::normalizer_system(),
            raw.content(),
        )
        .json();

        match provider.backend.complete(&request).await {
            Ok(text) => match parse_normalized_query(&text) {
                Some(mut normalized) => {
                    if normalized.normalized_text.trim().is_empty() {
                        normalized.normalized_text = raw.content().to_string();
                    }
                    Outcome::Success(normalized)
                }
                None => {
                    warn!(model = %model, "Normalizer returned unusable JSON");
                    Outcome::fallback(fallback(), "malformed normalizer output")
                }
            },
            Err(e) => {
                warn!(model = %model, error = %e, "Normalizer call failed");
                Outcome::fallback(fallback(), e.to_string())
            }
        }
    }
}
