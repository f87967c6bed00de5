//! Application layer for consensus-council
//!
//! This crate contains the stage use cases, the run orchestrator, port
//! definitions, provider resolution and credential handling.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CredentialStore, CredentialUpdate, Credentials, EnvKeys};
pub use ports::{
    conversation_store::{ConversationStore, ConversationSummary, StoreError, StoredConversation},
    llm_gateway::{
        BackendFactory, ChatMessage, ChatRequest, ChatRole, GatewayError, LlmBackend,
    },
    progress::{CompositeObserver, NoObserver, PipelineObserver},
};
pub use registry::{ProviderRegistry, ProviderStatus, ResolvedProvider};
pub use use_cases::execute::{DEFAULT_MODEL_COUNT, MAX_MODEL_COUNT, MIN_MODEL_COUNT};
pub use use_cases::run_consensus::{PipelineError, RunConsensusInput, RunConsensusUseCase};
