//! Error types for the cache crate.

use std::fmt;

/// Errors reported by a cache backend.
///
/// None of these are fatal to a request: the read path treats them as
/// misses and writers log them after invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backend could not be reached or answered with an error.
    Unavailable { details: String },
    /// The backend is full and refused the entry.
    CapacityExceeded { max_entries: usize },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "cache unavailable: {details}"),
            Self::CapacityExceeded { max_entries } => {
                write!(f, "cache is full ({max_entries} entries)")
            }
        }
    }
}

impl std::error::Error for CacheError {}
