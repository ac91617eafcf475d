//! Resource links attached to summaries by moderators.
//!
//! Links live beside the summary rather than inside it, so adding or
//! removing one leaves the summary's version and cache entry alone.

use crate::error::ModerationError;
use crate::store::SummaryStore;
use crate::summary::ResourceLink;
use crate::validation;
use crate::workflow::store_error;
use factnotes_core::{ResourceLinkId, SummaryId};
use factnotes_platform_access::{Caller, Role};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ResourceLinkRegistry {
    store: Arc<dyn SummaryStore>,
}

impl ResourceLinkRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn SummaryStore>) -> Self {
        Self { store }
    }

    /// Attaches a link to a summary.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` below moderator, `Validation` for a
    /// non-http(s) URL, a short title or a short description, and
    /// `NotFound` for unknown summaries.
    #[instrument(skip_all, fields(summary_id = %summary_id))]
    pub async fn add(
        &self,
        caller: &Caller,
        summary_id: SummaryId,
        url: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<ResourceLink, Report<ModerationError>> {
        let moderator = caller
            .require("add resource links", &[Role::Moderator])
            .map_err(ModerationError::from)?;
        let url = validation::link_url(url)?;
        validation::link_title(title)?;
        let description = validation::link_description(description)?;

        let link = ResourceLink::new(
            summary_id,
            url.to_string(),
            title.trim().to_string(),
            description,
            moderator.user_id(),
        );
        self.store.add_link(&link).await.map_err(store_error)?;
        info!(link_id = %link.id, "resource link added");
        Ok(link)
    }

    /// Deletes a link.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` below moderator and `NotFound` for
    /// unknown links.
    #[instrument(skip_all, fields(link_id = %link_id))]
    pub async fn remove(
        &self,
        caller: &Caller,
        link_id: ResourceLinkId,
    ) -> Result<(), Report<ModerationError>> {
        caller
            .require("remove resource links", &[Role::Moderator])
            .map_err(ModerationError::from)?;
        self.store.remove_link(link_id).await.map_err(store_error)?;
        info!("resource link removed");
        Ok(())
    }

    /// Deletes a link, requiring that it belongs to `summary_id`.
    ///
    /// # Errors
    ///
    /// As [`Self::remove`]; a link attached elsewhere is `NotFound`.
    pub async fn remove_from(
        &self,
        caller: &Caller,
        summary_id: SummaryId,
        link_id: ResourceLinkId,
    ) -> Result<(), Report<ModerationError>> {
        caller
            .require("remove resource links", &[Role::Moderator])
            .map_err(ModerationError::from)?;
        let link = self.store.find_link(link_id).await.map_err(store_error)?;
        if link.is_none_or(|l| l.summary_id != summary_id) {
            return Err(ModerationError::not_found("resource_link", link_id).into());
        }
        self.remove(caller, link_id).await
    }

    /// Links of a summary in creation order.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    pub async fn list(&self, summary_id: SummaryId) -> Result<Vec<ResourceLink>, Report<ModerationError>> {
        Ok(self.store.list_links(summary_id).await.map_err(store_error)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySummaryStore;
    use crate::summary::{Summary, SummaryRequest};
    use factnotes_core::UserId;

    async fn fixture() -> (ResourceLinkRegistry, Summary) {
        let store = Arc::new(InMemorySummaryStore::new());
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
        (ResourceLinkRegistry::new(store), summary)
    }

    fn moderator() -> Caller {
        Caller::user(UserId::new(), Role::Moderator)
    }

    #[tokio::test]
    async fn moderator_adds_and_removes_link() {
        let (registry, summary) = fixture().await;
        let link = registry
            .add(
                &moderator(),
                summary.id,
                "https://example.org/source",
                "Primary source",
                Some("Original publication of the claim"),
            )
            .await
            .expect("add");
        assert_eq!(link.url, "https://example.org/source");

        let listed = registry.list(summary.id).await.expect("list");
        assert_eq!(listed, vec![link.clone()]);

        registry
            .remove_from(&moderator(), summary.id, link.id)
            .await
            .expect("remove");
        assert!(registry.list(summary.id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn plain_user_cannot_add() {
        let (registry, summary) = fixture().await;
        let user = Caller::user(UserId::new(), Role::User);
        let report = registry
            .add(&user, summary.id, "https://example.org", "Source", None)
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::PermissionDenied { .. }
        ));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let (registry, summary) = fixture().await;
        let report = registry
            .add(&moderator(), summary.id, "ftp://example.org/file", "Source", None)
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::Validation { field: "url", .. }
        ));
    }

    #[tokio::test]
    async fn unknown_summary_is_not_found() {
        let (registry, _) = fixture().await;
        let report = registry
            .add(&moderator(), SummaryId::new(), "https://example.org", "Source", None)
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn removing_unknown_link_is_not_found() {
        let (registry, summary) = fixture().await;
        let report = registry
            .remove_from(&moderator(), summary.id, ResourceLinkId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::NotFound { entity: "resource_link", .. }
        ));

        let report = registry
            .remove(&moderator(), ResourceLinkId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ModerationError::NotFound { .. }
        ));
    }
}
