//! Peer review stage
//!
//! Responses are anonymized as `Response_A`, `Response_B`, ... and the first
//! catalog models of the resolved provider score each other's answers
//! concurrently. A reviewer never sees or scores its own answer.

use crate::ports::llm_gateway::ChatRequest;
use crate::ports::progress::PipelineObserver;
use crate::registry::ResolvedProvider;
use council_domain::consensus::parsing::{ReviewEntry, parse_review_entries};
use council_domain::{
    LockedContext, ModelDescriptor, ModelResponse, PeerReview, PromptTemplate, Stage, StageEvent,
};
use futures::future::join_all;
use tracing::{info, warn};

/// Anonymous label of the response at `index` (0 -> "Response_A").
pub fn response_label(index: usize) -> String {
    match u8::try_from(index).ok().filter(|i| *i < 26) {
        Some(i) => format!("Response_{}", char::from(b'A' + i)),
        None => format!("Response_{}", index + 1),
    }
}

pub struct PeerReviewer<'a> {
    provider: Option<&'a ResolvedProvider>,
    observer: &'a dyn PipelineObserver,
}

impl<'a> PeerReviewer<'a> {
    pub fn new(provider: Option<&'a ResolvedProvider>, observer: &'a dyn PipelineObserver) -> Self {
        Self { provider, observer }
    }

    /// Number of reviewer calls this stage will make
    pub fn reviewer_count(&self) -> usize {
        self.provider.map_or(0, |p| p.reviewer_models().len())
    }

    /// Collect reviews from every reviewer, concatenated in reviewer order.
    ///
    /// Without a provider there is nobody to review and the list is empty.
    pub async fn review(
        &self,
        context: &LockedContext,
        responses: &[ModelResponse],
    ) -> Vec<PeerReview> {
        let Some(provider) = self.provider else {
            return Vec::new();
        };

        let labeled: Vec<(String, &ModelResponse)> = responses
            .iter()
            .enumerate()
            .map(|(i, r)| (response_label(i), r))
            .collect();

        join_all(
            provider
                .reviewer_models()
                .iter()
                .map(|reviewer| self.review_as(provider, reviewer, context, &labeled)),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    async fn review_as(
        &self,
        provider: &ResolvedProvider,
        reviewer: &ModelDescriptor,
        context: &LockedContext,
        labeled: &[(String, &ModelResponse)],
    ) -> Vec<PeerReview> {
        let visible: Vec<(String, String)> = labeled
            .iter()
            .filter(|(_, r)| r.model_id != reviewer.display_name)
            .map(|(label, r)| (label.clone(), r.response_text.clone()))
            .collect();

        if visible.is_empty() {
            self.task_completed(reviewer, true);
            return Vec::new();
        }

        let request = ChatRequest::user(&reviewer.id, PromptTemplate::review_prompt(context, &visible)).json();

        let reviews = match provider.backend.complete(&request).await {
            Ok(text) => match parse_review_entries(&text) {
                Some(entries) => Some(
                    entries
                        .into_iter()
                        .filter_map(|entry| Self::to_review(reviewer, entry, labeled))
                        .collect::<Vec<_>>(),
                ),
                None => {
                    warn!(reviewer = %reviewer.id, "Peer review returned unusable JSON");
                    None
                }
            },
            Err(e) => {
                warn!(reviewer = %reviewer.id, error = %e, "Peer review failed");
                None
            }
        };

        self.task_completed(reviewer, reviews.is_some());
        let reviews = reviews.unwrap_or_default();
        info!(reviewer = %reviewer.id, count = reviews.len(), "Peer review collected");
        reviews
    }

    /// Resolve the label and drop reviews of the reviewer's own answer.
    fn to_review(
        reviewer: &ModelDescriptor,
        entry: ReviewEntry,
        labeled: &[(String, &ModelResponse)],
    ) -> Option<PeerReview> {
        let reviewed_model = labeled
            .iter()
            .find(|(label, _)| *label == entry.response_id)
            .map_or_else(|| entry.response_id.clone(), |(_, r)| r.model_id.clone());

        if reviewed_model == reviewer.display_name {
            return None;
        }

        Some(PeerReview {
            reviewer_model: reviewer.short_id().to_string(),
            reviewed_model,
            accuracy_score: entry.accuracy,
            insight_score: entry.insight,
            constraint_adherence_score: entry.constraint_adherence,
            feedback_text: entry.feedback,
        })
    }

    fn task_completed(&self, reviewer: &ModelDescriptor, success: bool) {
        self.observer.on_event(&StageEvent::TaskCompleted {
            stage: Stage::PeerReview,
            label: reviewer.display_name.clone(),
            success,
        });
    }
}
