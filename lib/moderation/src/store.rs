//! System-of-record contract for summaries.
//!
//! Operations that touch more than one record, or that must not race, are
//! single trait methods so each implementation can make them atomic.

use crate::status::SummaryStatus;
use crate::summary::{ModerationDecision, ResourceLink, Summary, SummaryEdit, SummaryRequest};
use async_trait::async_trait;
use factnotes_core::{Page, ResourceLinkId, StoreError, SummaryId, SummaryRequestId};

/// Persistent storage for requests, summaries, edits and links.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Persists a request and its pending summary together.
    async fn create_submission(
        &self,
        request: &SummaryRequest,
        summary: &Summary,
    ) -> Result<(), StoreError>;

    async fn find_request(&self, id: SummaryRequestId)
    -> Result<Option<SummaryRequest>, StoreError>;

    /// Lists requests, newest first.
    async fn list_requests(&self, page: Page) -> Result<Vec<SummaryRequest>, StoreError>;

    async fn find_summary(&self, id: SummaryId) -> Result<Option<Summary>, StoreError>;

    /// Lists summaries, newest first, optionally filtered by status.
    async fn list_summaries(
        &self,
        page: Page,
        status: Option<SummaryStatus>,
    ) -> Result<Vec<Summary>, StoreError>;

    /// Overwrites the rating and returns the updated summary.
    async fn set_rating(&self, id: SummaryId, rating: f64) -> Result<Summary, StoreError>;

    /// Records a verdict if the summary is still in `expected` status.
    ///
    /// Fails with `Conflict` if the status has moved. The originating
    /// request's status follows.
    async fn record_decision(
        &self,
        id: SummaryId,
        expected: SummaryStatus,
        decision: &ModerationDecision,
    ) -> Result<Summary, StoreError>;

    /// Attaches summarizer output and moves a pending summary to
    /// `AiReviewed`. Returns false, changing nothing, if the summary is no
    /// longer pending.
    async fn attach_ai_summary(&self, id: SummaryId, text: &str) -> Result<bool, StoreError>;

    /// Appends an edit and updates the summary's content and version, if
    /// the summary is still at `expected_version`.
    ///
    /// Fails with `Conflict` if the version has moved.
    async fn append_edit(
        &self,
        edit: &SummaryEdit,
        expected_version: i32,
    ) -> Result<Summary, StoreError>;

    /// Edits of a summary in version order.
    async fn list_edits(&self, id: SummaryId) -> Result<Vec<SummaryEdit>, StoreError>;

    /// Stores a link. Fails with `NotFound` if the summary does not exist.
    async fn add_link(&self, link: &ResourceLink) -> Result<(), StoreError>;

    async fn find_link(&self, id: ResourceLinkId) -> Result<Option<ResourceLink>, StoreError>;

    /// Deletes a link. Fails with `NotFound` if it does not exist.
    async fn remove_link(&self, id: ResourceLinkId) -> Result<(), StoreError>;

    /// Links of a summary in creation order.
    async fn list_links(&self, summary_id: SummaryId) -> Result<Vec<ResourceLink>, StoreError>;
}
