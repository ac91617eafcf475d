//! Error handling foundation for the factnotes platform.
//!
//! This module provides the `Result` type alias using rootcause and the
//! error shared by every system-of-record trait. Each crate defines its own
//! domain-specific error types in its own error module.

use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer adds its own context via `.context()` as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Errors returned by system-of-record implementations.
///
/// Store traits in the domain crates return this directly; the domain
/// layer decides which variants are caller mistakes and which are internal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed record does not exist.
    NotFound { entity: &'static str, id: String },
    /// A conditional write lost against a concurrent change, or a unique
    /// constraint was violated.
    Conflict { entity: &'static str, details: String },
    /// The backing store failed.
    Backend { details: String },
}

impl StoreError {
    /// Shorthand for a missing record.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a backend failure.
    #[must_use]
    pub fn backend(details: impl fmt::Display) -> Self {
        Self::Backend {
            details: details.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} '{id}' not found"),
            Self::Conflict { entity, details } => {
                write!(f, "conflicting write to {entity}: {details}")
            }
            Self::Backend { details } => write!(f, "store backend error: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.expect("should be ok"), 42);
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::not_found("summary", "sum_123");
        assert_eq!(err.to_string(), "summary 'sum_123' not found");

        let err = StoreError::backend("connection reset");
        assert!(err.to_string().contains("connection reset"));
    }
}
