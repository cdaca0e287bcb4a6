//! Error types for network construction and query execution.

use thiserror::Error;

/// Errors that can occur while building a network or executing a query.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// Every failure is local to the call that produced it. A failed `execute()`
/// leaves the shared network untouched, and re-running it with the same inputs
/// fails the same way because failures come from data defects, not transient
/// conditions.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecError {
    /// Rejected network construction (duplicate label, bad CPT line, cycle).
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed or incomplete conditional probability table.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Operation invoked on an event state whose role does not permit it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller supplied an id, label, or value outside the network's domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The evidence has zero probability under the network.
    #[error("unsatisfiable evidence: {0}")]
    UnsatisfiableEvidence(String),

    /// Probability mass became NaN or infinite.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Internal execution error (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}
