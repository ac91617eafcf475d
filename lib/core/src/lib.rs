//! Core domain types and utilities for the factnotes platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used by the access, cache and moderation crates.

pub mod error;
pub mod id;
pub mod page;

pub use error::{Result, StoreError};
pub use id::{
    CredentialId, ParseIdError, ResourceLinkId, SummaryEditId, SummaryId, SummaryRequestId,
    UserId,
};
pub use page::Page;
