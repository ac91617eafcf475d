//! Postgres implementations of the system-of-record traits.
//!
//! This module provides data access for:
//! - Users ([`PgUserStore`])
//! - Summary requests, summaries, edits and resource links
//!   ([`PgSummaryStore`])
//!
//! Multi-row writes run in a single transaction. Compare-and-set writes
//! put the expected value in the `WHERE` clause and report `Conflict` when
//! no row matched but the record exists.

pub mod summaries;
pub mod users;

pub use summaries::PgSummaryStore;
pub use users::PgUserStore;

use factnotes_core::StoreError;

/// Maps a driver error onto the store contract.
fn store_error(entity: &'static str, err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return StoreError::Conflict {
                entity,
                details: db.message().to_string(),
            };
        }
    }
    StoreError::backend(format!("{entity}: {err}"))
}

fn decode_error(what: &str, value: &str, reason: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid {what} '{value}': {reason}"),
    )))
}
