//! Error types for the moderation crate.

use crate::status::SummaryStatus;
use factnotes_core::{SummaryId, UserId};
use factnotes_platform_access::AuthorizationError;
use std::fmt;

/// Errors from moderation operations.
///
/// Input and authorization failures are reported as-is. Store failures
/// collapse into `Store`; their detail is logged where they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    /// The caller is anonymous.
    NotAuthenticated,
    /// The caller's role does not allow the operation.
    PermissionDenied { user_id: UserId, action: String },
    /// An input failed validation.
    Validation { field: &'static str, reason: String },
    /// The moderation action is not `approve` or `reject`.
    InvalidAction { action: String },
    /// The summary's status does not allow the operation.
    InvalidStatus {
        summary_id: SummaryId,
        status: SummaryStatus,
    },
    /// The addressed record does not exist.
    NotFound { entity: &'static str, id: String },
    /// A concurrent change won; the caller should re-read and retry.
    Conflict { entity: &'static str, details: String },
    /// The system of record failed.
    Store { details: String },
}

impl ModerationError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for ModerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "user is not authenticated"),
            Self::PermissionDenied { user_id, action } => {
                write!(f, "user {user_id} lacks permission to {action}")
            }
            Self::Validation { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::InvalidAction { action } => {
                write!(f, "invalid moderation action '{action}', expected approve or reject")
            }
            Self::InvalidStatus { summary_id, status } => {
                write!(f, "summary {summary_id} is {status} and can no longer be moderated")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} '{id}' not found"),
            Self::Conflict { entity, details } => {
                write!(f, "conflicting update to {entity}: {details}")
            }
            Self::Store { details } => write!(f, "summary store error: {details}"),
        }
    }
}

impl std::error::Error for ModerationError {}

impl From<AuthorizationError> for ModerationError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::NotAuthenticated => Self::NotAuthenticated,
            AuthorizationError::PermissionDenied {
                user_id, action, ..
            } => Self::PermissionDenied { user_id, action },
        }
    }
}
