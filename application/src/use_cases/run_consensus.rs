//! Run Consensus use case
//!
//! Orchestrates the full council flow: nine stages in fixed order, each
//! recording its output on the [`RunState`]. Degradable calls fall back
//! inside their stage; only pipeline-fatal errors (a missing stage input, a
//! persistence failure or a panic) stop the run, and even then the partial
//! state is returned with status `aborted`.

use super::execute::{DEFAULT_MODEL_COUNT, ParallelExecutor, clamp_model_count};
use super::extract_claims::ClaimExtractor;
use super::normalize::QueryNormalizer;
use super::peer_review::PeerReviewer;
use super::synthesize::Synthesizer;
use crate::config::CredentialStore;
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::llm_gateway::BackendFactory;
use crate::ports::progress::{NoObserver, PipelineObserver};
use crate::registry::{ProviderRegistry, ResolvedProvider};
use council_domain::{
    HIGH_CONFIDENCE_THRESHOLD, Outcome, ProviderFamily, RawQuery, RunState, Stage, StageEvent,
    cluster_claims, lock_constraints, score_clusters,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage} has no input: {missing} was not recorded")]
    MissingInput { stage: Stage, missing: &'static str },

    #[error("Saving the conversation failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("{stage} panicked: {message}")]
    Panicked { stage: Stage, message: String },
}

/// Input for the RunConsensus use case
#[derive(Debug, Clone)]
pub struct RunConsensusInput {
    pub query: RawQuery,
    /// Number of models to query, clamped to 1..=4
    pub model_count: usize,
    /// Family to use for the single-call stages when it has a key
    pub preferred_provider: Option<ProviderFamily>,
}

impl RunConsensusInput {
    pub fn new(query: RawQuery) -> Self {
        Self {
            query,
            model_count: DEFAULT_MODEL_COUNT,
            preferred_provider: None,
        }
    }

    pub fn with_model_count(mut self, model_count: usize) -> Self {
        self.model_count = clamp_model_count(model_count);
        self
    }

    pub fn with_preferred_provider(mut self, family: Option<ProviderFamily>) -> Self {
        self.preferred_provider = family;
        self
    }
}

/// Everything one run needs, fixed at run start
struct RunContext<'a> {
    registry: ProviderRegistry,
    provider: Option<ResolvedProvider>,
    model_count: usize,
    observer: &'a dyn PipelineObserver,
}

/// Use case for running a council
pub struct RunConsensusUseCase {
    credentials: Arc<CredentialStore>,
    factory: Arc<dyn BackendFactory>,
    store: Option<Arc<dyn ConversationStore>>,
}

impl RunConsensusUseCase {
    pub fn new(credentials: Arc<CredentialStore>, factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            credentials,
            factory,
            store: None,
        }
    }

    /// Persist finished runs to `store`. Without a store the Persist stage
    /// is a no-op.
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Execute the use case with no progress reporting
    pub async fn execute(&self, input: RunConsensusInput) -> RunState {
        self.execute_with_observer(input, &NoObserver).await
    }

    /// Execute the use case, reporting stage transitions to `observer`.
    ///
    /// Never fails: callers inspect `status`, `errors` and which fields are
    /// present on the returned state.
    pub async fn execute_with_observer(
        &self,
        input: RunConsensusInput,
        observer: &dyn PipelineObserver,
    ) -> RunState {
        let registry = ProviderRegistry::new(self.credentials.snapshot(), Arc::clone(&self.factory));
        let provider = registry.resolve(input.preferred_provider);
        let ctx = RunContext {
            registry,
            provider,
            model_count: clamp_model_count(input.model_count),
            observer,
        };

        info!(
            provider = ?ctx.provider.as_ref().map(|p| p.family),
            model_count = ctx.model_count,
            "Starting council run"
        );

        let mut state = RunState::new(input.query);

        for stage in Stage::SEQUENCE {
            observer.on_event(&StageEvent::StageStarted {
                stage,
                total_tasks: self.task_count(stage, &ctx, &state),
            });

            let result = AssertUnwindSafe(self.run_stage(stage, &ctx, &mut state))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(PipelineError::Panicked {
                        stage,
                        message: panic_message(payload.as_ref()),
                    })
                });

            match result {
                Ok(summary) => {
                    debug!(stage = %stage, summary = %summary, "Stage completed");
                    observer.on_event(&StageEvent::StageCompleted { stage, summary });
                }
                Err(e) => {
                    error!(stage = %stage, error = %e, "Run aborted");
                    state.abort(e.to_string());
                    observer.on_event(&StageEvent::RunAborted {
                        stage,
                        error: e.to_string(),
                    });
                    return state;
                }
            }
        }

        state.complete();
        info!(conversation_id = ?state.conversation_id, "Council run completed");
        observer.on_event(&StageEvent::RunCompleted {
            conversation_id: state.conversation_id.clone(),
        });
        state
    }

    /// Fan-out width announced when `stage` starts
    fn task_count(&self, stage: Stage, ctx: &RunContext<'_>, state: &RunState) -> usize {
        match stage {
            Stage::Execute => ParallelExecutor::new(&ctx.registry, ctx.observer)
                .select_models(ctx.model_count)
                .len()
                .max(1),
            Stage::ExtractClaims => state.model_responses.as_ref().map_or(0, Vec::len),
            Stage::PeerReview => {
                PeerReviewer::new(ctx.provider.as_ref(), ctx.observer).reviewer_count()
            }
            _ => 1,
        }
    }

    /// Run one stage and return its summary line.
    async fn run_stage(
        &self,
        stage: Stage,
        ctx: &RunContext<'_>,
        state: &mut RunState,
    ) -> Result<String, PipelineError> {
        let provider = ctx.provider.as_ref();

        match stage {
            Stage::Normalize => {
                let outcome = QueryNormalizer::new(provider).normalize(&state.raw_input).await;
                let summary = describe(&outcome, |n| format!("Intent: {}, Domain: {}", n.intent, n.domain));
                state.normalized = Some(outcome.into_value());
                Ok(summary)
            }
            Stage::LockConstraints => {
                let normalized = required(stage, state.normalized.clone(), "normalized query")?;
                let locked = lock_constraints(normalized);
                let summary = format!(
                    "Locked {} constraints (hash {})",
                    locked.merged_constraints.len(),
                    locked.constraint_hash
                );
                state.locked_context = Some(locked);
                Ok(summary)
            }
            Stage::Execute => {
                let context = required(stage, state.locked_context.as_ref(), "locked context")?;
                let executor = ParallelExecutor::new(&ctx.registry, ctx.observer);
                let models = executor.select_models(ctx.model_count);
                let responses = executor.execute(context, &models).await;
                let failed = responses.iter().filter(|r| !r.is_success()).count();
                let summary = format!("{} responses ({} failed)", responses.len(), failed);
                state.model_responses = Some(responses);
                Ok(summary)
            }
            Stage::ExtractClaims => {
                let responses = required(stage, state.model_responses.as_deref(), "model responses")?;
                let sets = ClaimExtractor::new(provider, ctx.observer)
                    .extract(responses)
                    .await;
                state.claim_sets = Some(sets);
                Ok(format!("{} claims", state.total_claims()))
            }
            Stage::PeerReview => {
                let context = required(stage, state.locked_context.as_ref(), "locked context")?;
                let responses = required(stage, state.model_responses.as_deref(), "model responses")?;
                let reviews = PeerReviewer::new(provider, ctx.observer)
                    .review(context, responses)
                    .await;
                let summary = format!("{} reviews", reviews.len());
                state.peer_reviews = Some(reviews);
                Ok(summary)
            }
            Stage::Cluster => {
                let sets = required(stage, state.claim_sets.as_deref(), "claim sets")?;
                let clusters = cluster_claims(sets);
                let summary = format!("{} clusters", clusters.len());
                state.clusters = Some(clusters);
                Ok(summary)
            }
            Stage::Score => {
                let clusters = required(stage, state.clusters.clone(), "clusters")?;
                let reviews = required(stage, state.peer_reviews.as_deref(), "peer reviews")?;
                let scored = score_clusters(clusters, reviews);
                let high = scored
                    .iter()
                    .filter(|s| s.confidence_score >= HIGH_CONFIDENCE_THRESHOLD)
                    .count();
                let summary = format!("{} high confidence, {} uncertain", high, scored.len() - high);
                state.scored_clusters = Some(scored);
                Ok(summary)
            }
            Stage::Synthesize => {
                let context = required(stage, state.locked_context.as_ref(), "locked context")?;
                let scored = required(stage, state.scored_clusters.as_deref(), "scored clusters")?;
                let responses = required(stage, state.model_responses.as_deref(), "model responses")?;
                let outcome = Synthesizer::new(provider)
                    .synthesize(context, scored, responses, state.stage_trace())
                    .await;
                let summary = describe(&outcome, |c| format!("confidence {:.2}", c.confidence));
                state.consensus = Some(outcome.into_value());
                Ok(summary)
            }
            Stage::Persist => {
                let Some(store) = &self.store else {
                    return Ok("saving disabled".to_string());
                };
                let mut finished = state.clone();
                finished.complete();
                let id = store.save(&finished).await?;
                let summary = format!("saved as {}", id);
                state.conversation_id = Some(id);
                Ok(summary)
            }
        }
    }
}

fn required<T>(stage: Stage, value: Option<T>, missing: &'static str) -> Result<T, PipelineError> {
    value.ok_or(PipelineError::MissingInput { stage, missing })
}

fn describe<T>(outcome: &Outcome<T>, success: impl FnOnce(&T) -> String) -> String {
    match outcome {
        Outcome::Success(value) => success(value),
        Outcome::Fallback { cause, .. } => format!("fallback ({})", cause),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::ports::conversation_store::{ConversationSummary, StoredConversation};
    use crate::registry::test_support::*;
    use async_trait::async_trait;
    use council_domain::{ProviderAdapter, RunStatus};
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<RunState>>,
        fail: bool,
    }

    #[async_trait]
    impl ConversationStore for MemoryStore {
        async fn save(&self, state: &RunState) -> Result<String, StoreError> {
            if self.fail {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            let mut saved = self.saved.lock().unwrap();
            saved.push(state.clone());
            Ok(format!("conv-{}", saved.len()))
        }

        async fn load(&self, _id: &str) -> Result<Option<StoredConversation>, StoreError> {
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<StageEvent>>);

    impl PipelineObserver for Recorder {
        fn on_event(&self, event: &StageEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn query() -> RawQuery {
        RawQuery::try_new("Build a React app").unwrap()
    }

    fn use_case(credentials: Credentials, factory: ScriptedFactory) -> RunConsensusUseCase {
        RunConsensusUseCase::new(
            Arc::new(CredentialStore::isolated(credentials)),
            Arc::new(factory),
        )
    }

    fn full_openrouter_backend() -> ScriptedBackend {
        ScriptedBackend::new(ProviderAdapter::OpenRouter)
            .reply(
                "openai/gpt-4o-mini",
                r#"{"intent":"build_app","domain":"web_dev","explicit_constraints":{"framework":"react"},"inferred_constraints":{"language":"typescript"},"normalized_prompt":"Build a React web application"}"#,
            )
            .reply(
                "openai/gpt-4o",
                r#"{"final_answer":"Use React with Vite.","key_recommendations":["Use TypeScript"],"uncertain_areas":[],"reviews":[{"response_id":"Response_B","accuracy":8,"insight":8,"constraint_adherence":8,"feedback":"good"}]}"#,
            )
            .reply(
                "anthropic/claude-3.5-sonnet",
                r#"{"reviews":[{"response_id":"Response_A","accuracy":9,"insight":7,"constraint_adherence":8,"feedback":"clear"}]}"#,
            )
    }

    // ==================== Scenarios ====================

    #[tokio::test]
    async fn test_end_to_end_without_credentials() {
        let state = use_case(Credentials::default(), ScriptedFactory::default())
            .execute(RunConsensusInput::new(query()).with_model_count(2))
            .await;

        assert_eq!(state.status, RunStatus::Completed);
        assert!(state.errors.is_empty());

        let normalized = state.normalized.as_ref().unwrap();
        assert_eq!(normalized.intent, "general_query");
        assert_eq!(normalized.normalized_text, "Build a React app");

        let responses = state.model_responses.as_ref().unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].model_id, "system");
        assert_eq!(responses[0].token_count, 0);

        let sets = state.claim_sets.as_ref().unwrap();
        assert!(!sets.is_empty());
        assert!(sets.iter().all(|s| !s.claims.is_empty()));

        assert!(state.peer_reviews.as_ref().unwrap().is_empty());

        let consensus = state.consensus.as_ref().unwrap();
        assert_eq!(consensus.confidence, 0.3);
        assert!(!consensus.uncertain_areas.is_empty());
    }

    #[tokio::test]
    async fn test_full_run_with_openrouter() {
        let store = Arc::new(MemoryStore::default());
        let factory = Arc::new(ScriptedFactory::default().with(full_openrouter_backend()));
        let state = RunConsensusUseCase::new(
            Arc::new(CredentialStore::isolated(openrouter_only())),
            factory.clone(),
        )
        .with_store(store.clone())
        .execute(RunConsensusInput::new(query()).with_model_count(2))
        .await;

        assert_eq!(state.status, RunStatus::Completed);
        let locked = state.locked_context.as_ref().unwrap();
        assert_eq!(locked.merged_constraints["framework"], "react");
        assert_eq!(locked.merged_constraints["language"], "typescript");

        let ids: Vec<_> = state
            .model_responses
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r.model_id.as_str())
            .collect();
        assert_eq!(ids, vec!["GPT-4o (OR)", "Claude 3.5 Sonnet (OR)"]);

        assert_eq!(state.peer_reviews.as_ref().unwrap().len(), 2);
        assert!(!state.scored_clusters.as_ref().unwrap().is_empty());

        let consensus = state.consensus.as_ref().unwrap();
        assert_eq!(consensus.final_answer, "Use React with Vite.");
        assert_eq!(consensus.reasoning_trace.last().unwrap().step, "synthesis");

        let models = factory.backend(ProviderAdapter::OpenRouter).request_models();
        assert_eq!(models.len(), 8);
        assert_eq!(models.first().map(String::as_str), Some("openai/gpt-4o-mini"));
        assert_eq!(models.last().map(String::as_str), Some("openai/gpt-4o"));

        assert_eq!(state.conversation_id.as_deref(), Some("conv-1"));
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved[0].status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_persistence_failure_aborts_with_partial_state() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let recorder = Recorder::default();
        let state = use_case(Credentials::default(), ScriptedFactory::default())
            .with_store(store)
            .execute_with_observer(RunConsensusInput::new(query()), &recorder)
            .await;

        assert_eq!(state.status, RunStatus::Aborted);
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("disk full"));
        assert!(state.consensus.is_some());
        assert!(state.conversation_id.is_none());

        let events = recorder.0.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(StageEvent::RunAborted { stage: Stage::Persist, .. })
        ));
    }

    #[tokio::test]
    async fn test_panic_in_stage_aborts_run() {
        let factory = ScriptedFactory::default()
            .with(ScriptedBackend::new(ProviderAdapter::OpenRouter).panic_on("openai/gpt-4o-mini"));
        let state = use_case(openrouter_only(), factory)
            .execute(RunConsensusInput::new(query()))
            .await;

        assert_eq!(state.status, RunStatus::Aborted);
        assert!(state.errors[0].starts_with("Normalization panicked"));
        assert!(state.normalized.is_none());
        assert!(state.model_responses.is_none());
    }

    #[tokio::test]
    async fn test_events_follow_stage_order() {
        let recorder = Recorder::default();
        use_case(Credentials::default(), ScriptedFactory::default())
            .execute_with_observer(RunConsensusInput::new(query()), &recorder)
            .await;

        let events = recorder.0.lock().unwrap();
        let started: Vec<Stage> = events
            .iter()
            .filter_map(|e| match e {
                StageEvent::StageStarted { stage, .. } => Some(*stage),
                _ => None,
            })
            .collect();
        assert_eq!(started, Stage::SEQUENCE.to_vec());
        assert!(matches!(
            events.last(),
            Some(StageEvent::RunCompleted { conversation_id: None })
        ));
    }

    #[tokio::test]
    async fn test_credentials_snapshot_taken_per_run() {
        let credentials = Arc::new(CredentialStore::isolated(Credentials::default()));
        let factory = ScriptedFactory::default().with(ScriptedBackend::new(ProviderAdapter::Groq));
        let uc = RunConsensusUseCase::new(Arc::clone(&credentials), Arc::new(factory));

        let first = uc.execute(RunConsensusInput::new(query()).with_model_count(1)).await;
        assert_eq!(first.model_responses.unwrap()[0].model_id, "system");

        credentials.update(crate::config::CredentialUpdate {
            groq_key: Some("g".into()),
            ..Default::default()
        });
        let second = uc.execute(RunConsensusInput::new(query()).with_model_count(1)).await;
        let responses = second.model_responses.unwrap();
        assert_eq!(responses[0].model_id, "Llama 3.3 70B");
        assert!(responses[0].response_text.starts_with("Error (groq):"));
    }

    #[test]
    fn test_input_clamps_model_count() {
        assert_eq!(RunConsensusInput::new(query()).with_model_count(9).model_count, 4);
        assert_eq!(RunConsensusInput::new(query()).with_model_count(0).model_count, 1);
        assert_eq!(RunConsensusInput::new(query()).model_count, 4);
    }
}
