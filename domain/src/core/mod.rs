//! Core domain concepts shared across all subdomains.
//!
//! - [`query::RawQuery`] - a validated user query
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod query;
