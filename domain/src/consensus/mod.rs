//! Deterministic consensus stages and LLM output parsing.
//!
//! Nothing in here performs I/O. The LLM-backed stages live in the
//! application layer and hand their raw text to [`parsing`].

pub mod clustering;
pub mod constraints;
pub mod parsing;
pub mod scoring;
