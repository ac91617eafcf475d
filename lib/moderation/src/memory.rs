//! In-memory summary store.
//!
//! All state sits behind one lock, which makes every trait method atomic.

use crate::status::SummaryStatus;
use crate::store::SummaryStore;
use crate::summary::{ModerationDecision, ResourceLink, Summary, SummaryEdit, SummaryRequest};
use async_trait::async_trait;
use factnotes_core::{Page, ResourceLinkId, StoreError, SummaryId, SummaryRequestId};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    requests: HashMap<SummaryRequestId, SummaryRequest>,
    summaries: HashMap<SummaryId, Summary>,
    edits: HashMap<SummaryId, Vec<SummaryEdit>>,
    links: HashMap<ResourceLinkId, ResourceLink>,
}

impl State {
    fn summary_mut(&mut self, id: SummaryId) -> Result<&mut Summary, StoreError> {
        self.summaries
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("summary", id))
    }

    fn mirror_status(&mut self, summary: &Summary) {
        if let Some(request) = self.requests.get_mut(&summary.request_id) {
            request.status = summary.status;
        }
    }
}

/// Summary store backed by maps, for tests and single-process setups.
#[derive(Default)]
pub struct InMemorySummaryStore {
    state: Mutex<State>,
}

impl InMemorySummaryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn create_submission(
        &self,
        request: &SummaryRequest,
        summary: &Summary,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.requests.contains_key(&request.id) || state.summaries.contains_key(&summary.id) {
            return Err(StoreError::Conflict {
                entity: "summary_request",
                details: format!("request {} already exists", request.id),
            });
        }
        state.requests.insert(request.id, request.clone());
        state.summaries.insert(summary.id, summary.clone());
        Ok(())
    }

    async fn find_request(
        &self,
        id: SummaryRequestId,
    ) -> Result<Option<SummaryRequest>, StoreError> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, page: Page) -> Result<Vec<SummaryRequest>, StoreError> {
        let state = self.state.lock().await;
        let mut all: Vec<&SummaryRequest> = state.requests.values().collect();
        all.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id.as_ulid())));
        Ok(page.apply(all.into_iter().cloned()))
    }

    async fn find_summary(&self, id: SummaryId) -> Result<Option<Summary>, StoreError> {
        Ok(self.state.lock().await.summaries.get(&id).cloned())
    }

    async fn list_summaries(
        &self,
        page: Page,
        status: Option<SummaryStatus>,
    ) -> Result<Vec<Summary>, StoreError> {
        let state = self.state.lock().await;
        let mut all: Vec<&Summary> = state
            .summaries
            .values()
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .collect();
        all.sort_by_key(|s| std::cmp::Reverse((s.created_at, s.id.as_ulid())));
        Ok(page.apply(all.into_iter().cloned()))
    }

    async fn set_rating(&self, id: SummaryId, rating: f64) -> Result<Summary, StoreError> {
        let mut state = self.state.lock().await;
        let summary = state.summary_mut(id)?;
        summary.rating = rating;
        summary.updated_at = chrono::Utc::now();
        Ok(summary.clone())
    }

    async fn record_decision(
        &self,
        id: SummaryId,
        expected: SummaryStatus,
        decision: &ModerationDecision,
    ) -> Result<Summary, StoreError> {
        let mut state = self.state.lock().await;
        let summary = state.summary_mut(id)?;
        if summary.status != expected {
            return Err(StoreError::Conflict {
                entity: "summary",
                details: format!("status is {}, expected {expected}", summary.status),
            });
        }
        summary.apply_decision(decision);
        let updated = summary.clone();
        state.mirror_status(&updated);
        Ok(updated)
    }

    async fn attach_ai_summary(&self, id: SummaryId, text: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let summary = state.summary_mut(id)?;
        if !summary.attach_ai_summary(text.to_string()) {
            return Ok(false);
        }
        let updated = summary.clone();
        state.mirror_status(&updated);
        Ok(true)
    }

    async fn append_edit(
        &self,
        edit: &SummaryEdit,
        expected_version: i32,
    ) -> Result<Summary, StoreError> {
        let mut state = self.state.lock().await;
        let summary = state.summary_mut(edit.summary_id)?;
        if summary.current_version != expected_version {
            return Err(StoreError::Conflict {
                entity: "summary",
                details: format!(
                    "version is {}, expected {expected_version}",
                    summary.current_version
                ),
            });
        }
        summary.apply_edit(edit);
        let updated = summary.clone();
        state
            .edits
            .entry(edit.summary_id)
            .or_default()
            .push(edit.clone());
        Ok(updated)
    }

    async fn list_edits(&self, id: SummaryId) -> Result<Vec<SummaryEdit>, StoreError> {
        let state = self.state.lock().await;
        let mut edits = state.edits.get(&id).cloned().unwrap_or_default();
        edits.sort_by_key(|e| e.version);
        Ok(edits)
    }

    async fn add_link(&self, link: &ResourceLink) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.summaries.contains_key(&link.summary_id) {
            return Err(StoreError::not_found("summary", link.summary_id));
        }
        state.links.insert(link.id, link.clone());
        Ok(())
    }

    async fn find_link(&self, id: ResourceLinkId) -> Result<Option<ResourceLink>, StoreError> {
        Ok(self.state.lock().await.links.get(&id).cloned())
    }

    async fn remove_link(&self, id: ResourceLinkId) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .links
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("resource_link", id))
    }

    async fn list_links(&self, summary_id: SummaryId) -> Result<Vec<ResourceLink>, StoreError> {
        let state = self.state.lock().await;
        let mut links: Vec<ResourceLink> = state
            .links
            .values()
            .filter(|l| l.summary_id == summary_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.created_at, l.id.as_ulid()));
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ModerationAction;
    use chrono::Utc;
    use factnotes_core::UserId;

    async fn submitted(store: &InMemorySummaryStore) -> (SummaryRequest, Summary) {
        let request = SummaryRequest::new(
            "Claim under review".to_string(),
            "{}".to_string(),
            UserId::new(),
        );
        let summary = Summary::for_request(&request);
        store
            .create_submission(&request, &summary)
            .await
            .expect("create");
        (request, summary)
    }

    fn decision(action: ModerationAction) -> ModerationDecision {
        ModerationDecision {
            moderator_id: UserId::new(),
            action,
            notes: Some("checked".to_string()),
            decided_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn decision_is_mirrored_on_request() {
        let store = InMemorySummaryStore::new();
        let (request, summary) = submitted(&store).await;

        store
            .record_decision(
                summary.id,
                SummaryStatus::Pending,
                &decision(ModerationAction::Approve),
            )
            .await
            .expect("decide");

        let request = store.find_request(request.id).await.expect("find").expect("exists");
        assert_eq!(request.status, SummaryStatus::Approved);
    }

    #[tokio::test]
    async fn decision_with_stale_status_conflicts() {
        let store = InMemorySummaryStore::new();
        let (_, summary) = submitted(&store).await;
        store
            .attach_ai_summary(summary.id, "tl;dr")
            .await
            .expect("attach");

        let err = store
            .record_decision(
                summary.id,
                SummaryStatus::Pending,
                &decision(ModerationAction::Approve),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn append_edit_checks_version() {
        let store = InMemorySummaryStore::new();
        let (_, summary) = submitted(&store).await;
        let editor = UserId::new();

        let first = SummaryEdit::new(summary.id, "Edited claim".to_string(), editor, 2, "one".to_string());
        store.append_edit(&first, 1).await.expect("first edit");

        let stale = SummaryEdit::new(summary.id, "Other claim".to_string(), editor, 2, "two".to_string());
        let err = store.append_edit(&stale, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let edits = store.list_edits(summary.id).await.expect("edits");
        assert_eq!(edits.len(), 1);
        let stored = store.find_summary(summary.id).await.expect("find").expect("exists");
        assert_eq!(stored.current_version, 2);
        assert_eq!(stored.content, "Edited claim");
    }

    #[tokio::test]
    async fn links_require_existing_summary() {
        let store = InMemorySummaryStore::new();
        let link = ResourceLink::new(
            SummaryId::new(),
            "https://example.com".to_string(),
            "Example".to_string(),
            None,
            UserId::new(),
        );
        let err = store.add_link(&link).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_summaries_filters_by_status() {
        let store = InMemorySummaryStore::new();
        let (_, first) = submitted(&store).await;
        submitted(&store).await;
        store
            .record_decision(
                first.id,
                SummaryStatus::Pending,
                &decision(ModerationAction::Approve),
            )
            .await
            .expect("decide");

        let approved = store
            .list_summaries(Page::default(), Some(SummaryStatus::Approved))
            .await
            .expect("list");
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id);

        let all = store
            .list_summaries(Page::default(), None)
            .await
            .expect("list");
        assert_eq!(all.len(), 2);
    }
}
