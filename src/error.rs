//! Error types for the memoization library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Memo Error Enum ==
/// Error returned by a memoized call.
///
/// The wrapped function's own error is carried unchanged so callers can
/// inspect it exactly as they would after a direct call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoError<E> {
    /// The wrapped function failed for this input. Nothing was cached.
    #[error("Underlying computation failed: {0}")]
    ComputationFailed(E),
}

impl<E> MemoError<E> {
    /// Returns the wrapped function's error.
    pub fn into_inner(self) -> E {
        match self {
            MemoError::ComputationFailed(err) => err,
        }
    }
}

// == Config Error Enum ==
/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting holds a value the cache cannot operate with
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// == Result Type Alias ==
/// Convenience Result type for memoized calls.
pub type Result<T, E> = std::result::Result<T, MemoError<E>>;
