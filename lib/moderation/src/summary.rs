//! Summary records: requests, summaries, edits and resource links.

use crate::status::{ModerationAction, SummaryStatus};
use chrono::{DateTime, Utc};
use factnotes_core::{ResourceLinkId, SummaryEditId, SummaryId, SummaryRequestId, UserId};
use serde::{Deserialize, Serialize};

/// The intake record of a submission.
///
/// Its status mirrors the summary created alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub id: SummaryRequestId,
    pub content: String,
    /// Free-form context supplied with the submission.
    pub metadata: String,
    pub author_id: UserId,
    pub status: SummaryStatus,
    pub created_at: DateTime<Utc>,
}

impl SummaryRequest {
    /// Creates a new pending request.
    #[must_use]
    pub fn new(content: String, metadata: String, author_id: UserId) -> Self {
        Self {
            id: SummaryRequestId::new(),
            content,
            metadata,
            author_id,
            status: SummaryStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// A content item under moderation.
///
/// `current_version` starts at 1 and equals one plus the number of edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: SummaryId,
    /// The request this summary was created from.
    pub request_id: SummaryRequestId,
    pub author_id: UserId,
    pub content: String,
    /// Text produced by the summarizer, once it has run.
    pub ai_summary: Option<String>,
    pub rating: f64,
    pub status: SummaryStatus,
    pub moderator_id: Option<UserId>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderator_notes: Option<String>,
    pub current_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Summary {
    /// Creates the pending summary for a freshly submitted request.
    #[must_use]
    pub fn for_request(request: &SummaryRequest) -> Self {
        Self {
            id: SummaryId::new(),
            request_id: request.id,
            author_id: request.author_id,
            content: request.content.clone(),
            ai_summary: None,
            rating: 0.0,
            status: SummaryStatus::Pending,
            moderator_id: None,
            moderated_at: None,
            moderator_notes: None,
            current_version: 1,
            created_at: request.created_at,
            updated_at: request.created_at,
        }
    }

    /// Returns true once the summarizer's text has been attached.
    #[must_use]
    pub fn is_ai_summarized(&self) -> bool {
        self.ai_summary.is_some()
    }

    /// Attaches summarizer output. Only a pending summary accepts it;
    /// returns false and leaves the summary untouched otherwise.
    pub fn attach_ai_summary(&mut self, text: String) -> bool {
        if !self.status.can_transition_to(SummaryStatus::AiReviewed) {
            return false;
        }
        self.ai_summary = Some(text);
        self.status = SummaryStatus::AiReviewed;
        self.updated_at = Utc::now();
        true
    }

    /// Applies a moderator's verdict. The caller checks the transition.
    pub fn apply_decision(&mut self, decision: &ModerationDecision) {
        self.status = decision.action.target_status();
        self.moderator_id = Some(decision.moderator_id);
        self.moderated_at = Some(decision.decided_at);
        self.moderator_notes = decision.notes.clone();
        self.updated_at = decision.decided_at;
    }

    /// Applies an edit's content and version. The caller checks the version.
    pub fn apply_edit(&mut self, edit: &SummaryEdit) {
        self.content = edit.content.clone();
        self.current_version = edit.version;
        self.updated_at = edit.edited_at;
    }
}

/// A moderator's verdict, as recorded on the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationDecision {
    pub moderator_id: UserId,
    pub action: ModerationAction,
    pub notes: Option<String>,
    pub decided_at: DateTime<Utc>,
}

/// One entry of a summary's append-only edit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEdit {
    pub id: SummaryEditId,
    pub summary_id: SummaryId,
    /// Content of the summary after this edit.
    pub content: String,
    pub edited_by: UserId,
    /// Version the summary has after this edit; the first edit is 2.
    pub version: i32,
    pub edit_message: String,
    pub edited_at: DateTime<Utc>,
}

impl SummaryEdit {
    #[must_use]
    pub fn new(
        summary_id: SummaryId,
        content: String,
        edited_by: UserId,
        version: i32,
        edit_message: String,
    ) -> Self {
        Self {
            id: SummaryEditId::new(),
            summary_id,
            content,
            edited_by,
            version,
            edit_message,
            edited_at: Utc::now(),
        }
    }
}

/// A reference attached to a summary by a moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub id: ResourceLinkId,
    pub summary_id: SummaryId,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl ResourceLink {
    #[must_use]
    pub fn new(
        summary_id: SummaryId,
        url: String,
        title: String,
        description: Option<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            id: ResourceLinkId::new(),
            summary_id,
            url,
            title,
            description,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// A summary together with its edit history and resource links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDetail {
    #[serde(flatten)]
    pub summary: Summary,
    /// Edits in version order.
    pub edit_history: Vec<SummaryEdit>,
    pub resources: Vec<ResourceLink>,
}
