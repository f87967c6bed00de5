//! Prompt domain
//!
//! Templates for every LLM-backed stage of a council run.

mod template;

pub use template::PromptTemplate;
