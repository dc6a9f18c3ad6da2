//! Error types for circuit operations

use thiserror::Error;

/// Errors that can occur at the crate's fallible edges.
///
/// The algebra itself defines no error taxonomy: failures raised by
/// user-supplied functions propagate synchronously and unmodified through
/// every combinator frame back to the invoker of the top-level run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CircuitError {
    /// A payload was requested from an event with no occurrence
    #[error("event carries no occurrence")]
    NoOccurrence,

    /// The registration's deregistration procedure was already consumed
    #[error("registration already released")]
    AlreadyReleased,
}

/// Result type for circuit operations
pub type CircuitResult<T> = Result<T, CircuitError>;
