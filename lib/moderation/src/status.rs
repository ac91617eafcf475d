//! Summary lifecycle states and moderation actions.
//!
//! ```text
//! Pending ──► AiReviewed ──► Approved | Rejected
//!    └──────────────────────► Approved | Rejected
//! ```
//!
//! `Approved` and `Rejected` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The moderation state of a summary (and of the request it came from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    /// Submitted, awaiting AI review or a moderator.
    Pending,
    /// AI summary attached, awaiting a moderator.
    AiReviewed,
    /// Accepted by a moderator.
    Approved,
    /// Rejected by a moderator, with notes.
    Rejected,
}

impl SummaryStatus {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Returns true if the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: SummaryStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::AiReviewed)
                | (Self::Pending | Self::AiReviewed, Self::Approved | Self::Rejected)
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AiReviewed => "ai_reviewed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status or action name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseNameError {}

impl FromStr for SummaryStatus {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "ai_reviewed" => Ok(Self::AiReviewed),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseNameError {
                kind: "summary status",
                value: other.to_string(),
            }),
        }
    }
}

/// A moderator's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    /// The terminal status this action moves a summary to.
    #[must_use]
    pub fn target_status(&self) -> SummaryStatus {
        match self {
            Self::Approve => SummaryStatus::Approved,
            Self::Reject => SummaryStatus::Rejected,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationAction {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(ParseNameError {
                kind: "moderation action",
                value: other.to_string(),
            }),
        }
    }
}
