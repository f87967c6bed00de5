//! Application-level configuration.
//!
//! - [`credentials`] - the runtime [`CredentialStore`] and the per-run
//!   [`Credentials`] snapshot every stage resolves backends from

pub mod credentials;

pub use credentials::{CredentialStore, CredentialUpdate, Credentials, EnvKeys};
