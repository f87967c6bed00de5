//! Explicit success vs. fallback result for a single degradable call.
//!
//! Stages that can always produce a well-formed value (normalization, claim
//! extraction, synthesis) return an [`Outcome`] instead of an error, so a
//! graceful degradation is visible in the type rather than hidden in a
//! caught error.

/// Result of a call that falls back to a deterministic value on failure
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The backend call produced the value
    Success(T),
    /// The call failed or was skipped; `value` is the deterministic fallback
    Fallback { value: T, cause: String },
}

impl<T> Outcome<T> {
    pub fn fallback(value: T, cause: impl Into<String>) -> Self {
        Outcome::Fallback {
            value,
            cause: cause.into(),
        }
    }

    /// Borrow the value regardless of which arm produced it.
    pub fn value(&self) -> &T {
        match self {
            Outcome::Success(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    /// Take the value regardless of which arm produced it.
    pub fn into_value(self) -> T {
        match self {
            Outcome::Success(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    /// Why the fallback was used, if it was.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Fallback { cause, .. } => Some(cause),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Fallback { value, cause } => Outcome::Fallback {
                value: f(value),
                cause,
            },
        }
    }
}
