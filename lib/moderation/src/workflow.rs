//! The moderation workflow.
//!
//! Summaries move `Pending -> AiReviewed -> {Approved, Rejected}`, or
//! straight from `Pending` to a verdict. Every write lands in the store
//! first and then invalidates the cached summary.

use crate::error::ModerationError;
use crate::status::SummaryStatus;
use crate::store::SummaryStore;
use crate::summarizer::{SummarizationJob, SummarizationSink, SummaryScheduler};
use crate::summary::{ModerationDecision, Summary, SummaryDetail, SummaryEdit, SummaryRequest};
use crate::validation;
use async_trait::async_trait;
use chrono::Utc;
use factnotes_cache::{CacheAsideStore, CacheConfig, CacheKey};
use factnotes_core::{Page, StoreError, SummaryId, SummaryRequestId};
use factnotes_platform_access::{Caller, Role};
use rootcause::prelude::Report;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Submission, moderation, editing and rating of summaries.
#[derive(Clone)]
pub struct ModerationWorkflow {
    store: Arc<dyn SummaryStore>,
    cache: CacheAsideStore,
    ttl: Duration,
    scheduler: Arc<dyn SummaryScheduler>,
}

impl ModerationWorkflow {
    /// Creates a workflow with the default summary cache lifetime.
    #[must_use]
    pub fn new(
        store: Arc<dyn SummaryStore>,
        cache: CacheAsideStore,
        scheduler: Arc<dyn SummaryScheduler>,
    ) -> Self {
        Self {
            store,
            cache,
            ttl: CacheConfig::default().summary_ttl(),
            scheduler,
        }
    }

    /// Sets how long summaries stay cached.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Accepts new content for moderation.
    ///
    /// Persists the request and its pending summary together, then queues
    /// summarization. A full or closed queue is logged; the summary simply
    /// stays pending.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` for anonymous callers and `Validation`
    /// for short content or empty metadata. Nothing is stored in either
    /// case.
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        caller: &Caller,
        content: &str,
        metadata: &str,
    ) -> Result<SummaryRequest, Report<ModerationError>> {
        let author = caller
            .require_authenticated()
            .map_err(ModerationError::from)?;
        validation::content(content)?;
        validation::required("metadata", metadata)?;

        let request = SummaryRequest::new(
            content.trim().to_string(),
            metadata.to_string(),
            author.user_id(),
        );
        let summary = Summary::for_request(&request);
        self.store
            .create_submission(&request, &summary)
            .await
            .map_err(store_error)?;
        info!(request_id = %request.id, summary_id = %summary.id, "summary request submitted");

        let job = SummarizationJob {
            request_id: request.id,
            summary_id: summary.id,
            content: request.content.clone(),
            metadata: request.metadata.clone(),
        };
        if let Err(e) = self.scheduler.schedule(job) {
            warn!(summary_id = %summary.id, error = %e, "summarization not scheduled");
        }

        Ok(request)
    }

    /// Records a moderator's verdict.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` below moderator, `InvalidAction` for
    /// anything but approve or reject, `Validation` for a rejection
    /// without notes, `NotFound` for unknown ids, `InvalidStatus` once a
    /// verdict exists and `Conflict` when a concurrent change wins.
    #[instrument(skip_all, fields(summary_id = %id, action = action))]
    pub async fn moderate(
        &self,
        caller: &Caller,
        id: SummaryId,
        action: &str,
        notes: Option<&str>,
    ) -> Result<Summary, Report<ModerationError>> {
        let moderator = caller
            .require("moderate summaries", &[Role::Moderator])
            .map_err(ModerationError::from)?;
        let action = validation::action(action)?;
        let notes = validation::notes_for(action, notes)?;

        let current = self.load_summary(id).await?;
        if current.status.is_terminal() {
            return Err(ModerationError::InvalidStatus {
                summary_id: id,
                status: current.status,
            }
            .into());
        }

        let decision = ModerationDecision {
            moderator_id: moderator.user_id(),
            action,
            notes,
            decided_at: Utc::now(),
        };
        let updated = self
            .store
            .record_decision(id, current.status, &decision)
            .await
            .map_err(store_error)?;
        self.cache.invalidate_or_log(&CacheKey::summary(id)).await;

        info!(status = %updated.status, moderator_id = %moderator.user_id(), "summary moderated");
        Ok(updated)
    }

    /// Replaces a summary's content, appending to its edit history.
    ///
    /// `expected_version` is the version the caller read; the edit
    /// produces `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` below moderator, `Validation` for short
    /// content or message, `NotFound` for unknown ids and `Conflict` when
    /// the summary is no longer at `expected_version`.
    #[instrument(skip_all, fields(summary_id = %id, expected_version = expected_version))]
    pub async fn edit(
        &self,
        caller: &Caller,
        id: SummaryId,
        expected_version: i32,
        content: &str,
        edit_message: &str,
    ) -> Result<Summary, Report<ModerationError>> {
        let editor = caller
            .require("edit summaries", &[Role::Moderator])
            .map_err(ModerationError::from)?;
        validation::content(content)?;
        validation::edit_message(edit_message)?;

        let cached = self.get_summary(id).await?;
        if cached.current_version != expected_version {
            // The cached copy can lag the store when an invalidation failed.
            let stored = self.load_summary(id).await?;
            if stored.current_version != expected_version {
                return Err(version_conflict(stored.current_version, expected_version).into());
            }
            debug!(
                cached_version = cached.current_version,
                stored_version = stored.current_version,
                "cached summary was stale"
            );
            self.cache.invalidate_or_log(&CacheKey::summary(id)).await;
        }

        let edit = SummaryEdit::new(
            id,
            content.trim().to_string(),
            editor.user_id(),
            expected_version + 1,
            edit_message.trim().to_string(),
        );
        let updated = self
            .store
            .append_edit(&edit, expected_version)
            .await
            .map_err(store_error)?;
        self.cache.invalidate_or_log(&CacheKey::summary(id)).await;

        info!(version = updated.current_version, "summary edited");
        Ok(updated)
    }

    /// Sets a summary's rating.
    ///
    /// # Errors
    ///
    /// Returns `Validation` outside `[0, 5]` and `NotFound` for unknown ids.
    #[instrument(skip_all, fields(summary_id = %id, rating = rating))]
    pub async fn rate(&self, id: SummaryId, rating: f64) -> Result<Summary, Report<ModerationError>> {
        validation::rating(rating)?;
        let updated = self
            .store
            .set_rating(id, rating)
            .await
            .map_err(store_error)?;
        self.cache.invalidate_or_log(&CacheKey::summary(id)).await;
        Ok(updated)
    }

    /// Returns a summary, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn get_summary(&self, id: SummaryId) -> Result<Summary, Report<ModerationError>> {
        self.cache
            .get_or_load(&CacheKey::summary(id), self.ttl, || self.load_summary(id))
            .await
    }

    /// Returns a summary with its edit history and links, read from the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn get_detail(&self, id: SummaryId) -> Result<SummaryDetail, Report<ModerationError>> {
        let summary = self.load_summary(id).await?;
        let edit_history = self.store.list_edits(id).await.map_err(store_error)?;
        let resources = self.store.list_links(id).await.map_err(store_error)?;
        Ok(SummaryDetail {
            summary,
            edit_history,
            resources,
        })
    }

    /// Lists summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    pub async fn list_summaries(
        &self,
        page: Page,
        status: Option<SummaryStatus>,
    ) -> Result<Vec<Summary>, Report<ModerationError>> {
        Ok(self
            .store
            .list_summaries(page, status)
            .await
            .map_err(store_error)?)
    }

    /// Lists submissions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    pub async fn list_requests(
        &self,
        page: Page,
    ) -> Result<Vec<SummaryRequest>, Report<ModerationError>> {
        Ok(self.store.list_requests(page).await.map_err(store_error)?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn get_request(
        &self,
        id: SummaryRequestId,
    ) -> Result<SummaryRequest, Report<ModerationError>> {
        match self.store.find_request(id).await.map_err(store_error)? {
            Some(request) => Ok(request),
            None => Err(ModerationError::not_found("summary_request", id).into()),
        }
    }

    /// Edit history of a summary in version order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn list_edits(&self, id: SummaryId) -> Result<Vec<SummaryEdit>, Report<ModerationError>> {
        self.load_summary(id).await?;
        Ok(self.store.list_edits(id).await.map_err(store_error)?)
    }

    /// Attaches summarizer output to a pending summary.
    ///
    /// Returns false, leaving the summary alone, if a moderator already
    /// acted on it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    #[instrument(skip_all, fields(summary_id = %id))]
    pub async fn complete_summarization(
        &self,
        id: SummaryId,
        text: &str,
    ) -> Result<bool, Report<ModerationError>> {
        Ok(self.attach_ai_summary(id, text).await?)
    }

    async fn attach_ai_summary(&self, id: SummaryId, text: &str) -> Result<bool, ModerationError> {
        let attached = self
            .store
            .attach_ai_summary(id, text)
            .await
            .map_err(store_error)?;
        if attached {
            self.cache.invalidate_or_log(&CacheKey::summary(id)).await;
        } else {
            debug!(summary_id = %id, "summary no longer pending");
        }
        Ok(attached)
    }

    async fn load_summary(&self, id: SummaryId) -> Result<Summary, Report<ModerationError>> {
        match self.store.find_summary(id).await.map_err(store_error)? {
            Some(summary) => Ok(summary),
            None => Err(ModerationError::not_found("summary", id).into()),
        }
    }
}

#[async_trait]
impl SummarizationSink for ModerationWorkflow {
    async fn complete(&self, summary_id: SummaryId, text: String) -> Result<bool, ModerationError> {
        self.attach_ai_summary(summary_id, &text).await
    }
}

fn version_conflict(current: i32, expected: i32) -> ModerationError {
    ModerationError::Conflict {
        entity: "summary",
        details: format!("version is {current}, expected {expected}"),
    }
}

pub(crate) fn store_error(err: StoreError) -> ModerationError {
    match err {
        StoreError::NotFound { entity, id } => ModerationError::NotFound { entity, id },
        StoreError::Conflict { entity, details } => ModerationError::Conflict { entity, details },
        StoreError::Backend { details } => {
            error!(error = %details, "summary store failure");
            ModerationError::Store { details }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySummaryStore;
    use crate::summarizer::ScheduleError;
    use factnotes_cache::MemoryCacheBackend;
    use factnotes_core::UserId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingScheduler {
        jobs: Mutex<Vec<SummarizationJob>>,
    }

    impl SummaryScheduler for RecordingScheduler {
        fn schedule(&self, job: SummarizationJob) -> Result<(), ScheduleError> {
            self.jobs.lock().expect("lock").push(job);
            Ok(())
        }
    }

    struct FullScheduler;

    impl SummaryScheduler for FullScheduler {
        fn schedule(&self, _: SummarizationJob) -> Result<(), ScheduleError> {
            Err(ScheduleError::QueueFull)
        }
    }

    struct Fixture {
        workflow: ModerationWorkflow,
        store: Arc<InMemorySummaryStore>,
        scheduler: Arc<RecordingScheduler>,
        backend: Arc<MemoryCacheBackend>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemorySummaryStore::new());
        let scheduler = Arc::new(RecordingScheduler::default());
        let backend = Arc::new(MemoryCacheBackend::new(64));
        let cache = CacheAsideStore::new(backend.clone());
        Fixture {
            workflow: ModerationWorkflow::new(store.clone(), cache, scheduler.clone()),
            store,
            scheduler,
            backend,
        }
    }

    fn author() -> Caller {
        Caller::user(UserId::new(), Role::User)
    }

    fn moderator() -> Caller {
        Caller::user(UserId::new(), Role::Moderator)
    }

    async fn submit(f: &Fixture) -> Summary {
        let request = f
            .workflow
            .submit(&author(), "The moon is made of rock.", "{\"source\":\"web\"}")
            .await
            .expect("submit");
        let summaries = f
            .store
            .list_summaries(Page::default(), None)
            .await
            .expect("list");
        summaries
            .into_iter()
            .find(|s| s.request_id == request.id)
            .expect("summary created")
    }

    #[tokio::test]
    async fn submit_persists_request_and_schedules_job() {
        let f = fixture();
        let summary = submit(&f).await;

        assert_eq!(summary.status, SummaryStatus::Pending);
        assert_eq!(summary.current_version, 1);
        let jobs = f.scheduler.jobs.lock().expect("lock");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].summary_id, summary.id);
        assert_eq!(jobs[0].request_id, summary.request_id);
    }

    #[tokio::test]
    async fn short_content_is_rejected_before_storing() {
        let f = fixture();
        let report = f
            .workflow
            .submit(&author(), "too short", "{}")
            .await
            .unwrap_err();

        assert!(matches!(
            report.current_context(),
            ModerationError::Validation { field: "content", .. }
        ));
        let stored = f.store.list_requests(Page::default()).await.expect("list");
        assert!(stored.is_empty());
        assert!(f.scheduler.jobs.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn empty_metadata_is_rejected() {
        let f = fixture();
        let report = f
            .workflow
            .submit(&author(), "Long enough content here", "  ")
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::Validation { field: "metadata", .. }
        ));
    }

    #[tokio::test]
    async fn anonymous_submit_is_rejected() {
        let f = fixture();
        let report = f
            .workflow
            .submit(&Caller::Anonymous, "Long enough content here", "{}")
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &ModerationError::NotAuthenticated);
    }

    #[tokio::test]
    async fn full_queue_does_not_fail_submit() {
        let store = Arc::new(InMemorySummaryStore::new());
        let cache = CacheAsideStore::new(Arc::new(MemoryCacheBackend::new(8)));
        let workflow = ModerationWorkflow::new(store.clone(), cache, Arc::new(FullScheduler));

        workflow
            .submit(&author(), "Long enough content here", "{}")
            .await
            .expect("submit");
        let stored = store.list_requests(Page::default()).await.expect("list");
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn reject_requires_notes() {
        let f = fixture();
        let summary = submit(&f).await;

        let report = f
            .workflow
            .moderate(&moderator(), summary.id, "reject", Some("   "))
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::Validation { field: "notes", .. }
        ));

        let rejected = f
            .workflow
            .moderate(&moderator(), summary.id, "reject", Some("unsupported claim"))
            .await
            .expect("reject");
        assert_eq!(rejected.status, SummaryStatus::Rejected);
        assert_eq!(rejected.moderator_notes.as_deref(), Some("unsupported claim"));
        assert!(rejected.moderated_at.is_some());
    }

    #[tokio::test]
    async fn plain_user_cannot_moderate() {
        let f = fixture();
        let summary = submit(&f).await;
        let user = author();

        let report = f
            .workflow
            .moderate(&user, summary.id, "approve", None)
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::PermissionDenied { .. }
        ));

        let stored = f.store.find_summary(summary.id).await.expect("find").expect("exists");
        assert_eq!(stored.status, SummaryStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_action_is_invalid() {
        let f = fixture();
        let summary = submit(&f).await;
        let report = f
            .workflow
            .moderate(&moderator(), summary.id, "escalate", None)
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::InvalidAction { .. }
        ));
    }

    #[tokio::test]
    async fn moderated_summary_cannot_be_moderated_again() {
        let f = fixture();
        let summary = submit(&f).await;
        f.workflow
            .moderate(&moderator(), summary.id, "approve", None)
            .await
            .expect("approve");

        let report = f
            .workflow
            .moderate(&moderator(), summary.id, "reject", Some("changed my mind"))
            .await
            .unwrap_err();
        assert_eq!(
            report.current_context(),
            &ModerationError::InvalidStatus {
                summary_id: summary.id,
                status: SummaryStatus::Approved,
            }
        );
    }

    #[tokio::test]
    async fn admin_can_moderate() {
        let f = fixture();
        let summary = submit(&f).await;
        let admin = Caller::user(UserId::new(), Role::Admin);
        let approved = f
            .workflow
            .moderate(&admin, summary.id, "approve", None)
            .await
            .expect("approve");
        assert_eq!(approved.status, SummaryStatus::Approved);

        let request = f.workflow.get_request(summary.request_id).await.expect("request");
        assert_eq!(request.status, SummaryStatus::Approved);
    }

    #[tokio::test]
    async fn sequential_edits_bump_version() {
        let f = fixture();
        let summary = submit(&f).await;
        let editor = moderator();

        for n in 1..=3 {
            f.workflow
                .edit(
                    &editor,
                    summary.id,
                    n,
                    &format!("Revised content number {n}"),
                    "fix wording",
                )
                .await
                .expect("edit");
        }

        let current = f.workflow.get_summary(summary.id).await.expect("get");
        assert_eq!(current.current_version, 4);
        assert_eq!(current.content, "Revised content number 3");

        let edits = f.workflow.list_edits(summary.id).await.expect("edits");
        let versions: Vec<i32> = edits.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn stale_version_conflicts() {
        let f = fixture();
        let summary = submit(&f).await;
        let editor = moderator();
        f.workflow
            .edit(&editor, summary.id, 1, "First revision here", "first")
            .await
            .expect("edit");

        let report = f
            .workflow
            .edit(&editor, summary.id, 1, "Second revision here", "second")
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::Conflict { .. }
        ));
        let edits = f.workflow.list_edits(summary.id).await.expect("edits");
        assert_eq!(edits.len(), 1);
    }

    #[tokio::test]
    async fn edit_validates_message() {
        let f = fixture();
        let summary = submit(&f).await;
        let report = f
            .workflow
            .edit(&moderator(), summary.id, 1, "Valid new content", "fix")
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::Validation { field: "edit_message", .. }
        ));
    }

    #[tokio::test]
    async fn writes_invalidate_cached_summary() {
        let f = fixture();
        let summary = submit(&f).await;

        f.workflow.get_summary(summary.id).await.expect("warm cache");
        assert_eq!(f.backend.len(), 1);

        let rated = f.workflow.rate(summary.id, 4.5).await.expect("rate");
        assert_eq!(rated.rating, 4.5);
        assert_eq!(f.backend.len(), 0);

        let fresh = f.workflow.get_summary(summary.id).await.expect("reload");
        assert_eq!(fresh.rating, 4.5);
    }

    #[tokio::test]
    async fn rating_out_of_range_is_rejected() {
        let f = fixture();
        let summary = submit(&f).await;
        for bad in [-0.5, 5.5, f64::NAN] {
            let report = f.workflow.rate(summary.id, bad).await.unwrap_err();
            assert!(matches!(
                report.current_context(),
                ModerationError::Validation { field: "rating", .. }
            ));
        }
    }

    #[tokio::test]
    async fn unknown_summary_is_not_found() {
        let f = fixture();
        let report = f.workflow.get_summary(SummaryId::new()).await.unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::NotFound { entity: "summary", .. }
        ));
    }

    #[tokio::test]
    async fn completion_only_applies_to_pending_summaries() {
        let f = fixture();
        let pending = submit(&f).await;
        let moderated = submit(&f).await;
        f.workflow
            .moderate(&moderator(), moderated.id, "approve", None)
            .await
            .expect("approve");

        assert!(
            f.workflow
                .complete_summarization(pending.id, "short version")
                .await
                .expect("complete")
        );
        assert!(
            !f.workflow
                .complete_summarization(moderated.id, "short version")
                .await
                .expect("complete")
        );

        let reviewed = f.workflow.get_summary(pending.id).await.expect("get");
        assert_eq!(reviewed.status, SummaryStatus::AiReviewed);
        assert_eq!(reviewed.ai_summary.as_deref(), Some("short version"));
        let approved = f.workflow.get_summary(moderated.id).await.expect("get");
        assert_eq!(approved.status, SummaryStatus::Approved);
        assert!(approved.ai_summary.is_none());
    }

    #[tokio::test]
    async fn detail_includes_history() {
        let f = fixture();
        let summary = submit(&f).await;
        f.workflow
            .edit(&moderator(), summary.id, 1, "Revised content here", "reword")
            .await
            .expect("edit");

        let detail = f.workflow.get_detail(summary.id).await.expect("detail");
        assert_eq!(detail.summary.current_version, 2);
        assert_eq!(detail.edit_history.len(), 1);
        assert!(detail.resources.is_empty());
    }

    struct Echo;

    #[async_trait]
    impl crate::summarizer::Summarizer for Echo {
        async fn summarize(
            &self,
            content: &str,
            _: &str,
        ) -> Result<String, crate::summarizer::SummarizerError> {
            Ok(format!("summary of: {content}"))
        }
    }

    #[tokio::test]
    async fn queued_summarization_reaches_ai_reviewed() {
        use crate::summarizer::{SummarizationConfig, SummarizationQueue};

        let config = SummarizationConfig {
            backoff_millis: 1,
            ..SummarizationConfig::default()
        };
        let store = Arc::new(InMemorySummaryStore::new());
        let cache = CacheAsideStore::new(Arc::new(MemoryCacheBackend::new(8)));
        let (queue, receiver) = SummarizationQueue::channel(config.queue_capacity);
        let workflow = ModerationWorkflow::new(store.clone(), cache, Arc::new(queue));
        let workers =
            SummarizationQueue::spawn_workers(&config, receiver, Arc::new(Echo), Arc::new(workflow.clone()));

        workflow
            .submit(&author(), "Water boils at 100 degrees.", "{}")
            .await
            .expect("submit");

        let reviewed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let summaries = store
                    .list_summaries(Page::default(), Some(SummaryStatus::AiReviewed))
                    .await
                    .expect("list");
                if let Some(summary) = summaries.into_iter().next() {
                    return summary;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("summarized in time");

        assert_eq!(
            reviewed.ai_summary.as_deref(),
            Some("summary of: Water boils at 100 degrees.")
        );
        for worker in workers {
            worker.abort();
        }
    }

    /// Memory backend whose deletes always fail, so invalidation never lands.
    struct StickyBackend(MemoryCacheBackend);

    #[async_trait]
    impl factnotes_cache::CacheBackend for StickyBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, factnotes_cache::CacheError> {
            self.0.get(key).await
        }

        async fn set(
            &self,
            key: &str,
            value: String,
            ttl: Duration,
        ) -> Result<(), factnotes_cache::CacheError> {
            self.0.set(key, value, ttl).await
        }

        async fn delete(&self, _key: &str) -> Result<(), factnotes_cache::CacheError> {
            Err(factnotes_cache::CacheError::Unavailable {
                details: "delete refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn edits_continue_when_cached_version_is_stale() {
        let store = Arc::new(InMemorySummaryStore::new());
        let cache = CacheAsideStore::new(Arc::new(StickyBackend(MemoryCacheBackend::new(64))));
        let workflow = ModerationWorkflow::new(
            store.clone(),
            cache,
            Arc::new(RecordingScheduler::default()),
        );
        workflow
            .submit(&author(), "The moon is made of rock.", "web")
            .await
            .expect("submit");
        let id = store
            .list_summaries(Page::default(), None)
            .await
            .expect("list")[0]
            .id;
        // Warm the cache at version 1; it will never be invalidated.
        workflow.get_summary(id).await.expect("get");

        let moderator = moderator();
        let second = workflow
            .edit(&moderator, id, 1, "The moon is mostly rock.", "first pass")
            .await
            .expect("edit from version 1");
        assert_eq!(second.current_version, 2);

        let third = workflow
            .edit(&moderator, id, 2, "The moon is silicate rock.", "second pass")
            .await
            .expect("edit from version 2 despite stale cache");
        assert_eq!(third.current_version, 3);

        let report = workflow
            .edit(&moderator, id, 2, "The moon is cheese after all.", "stale pass")
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::Conflict { .. }
        ));
        assert_eq!(store.list_edits(id).await.expect("edits").len(), 2);
    }
}
