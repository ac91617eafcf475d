//! Summary moderation for factnotes.
//!
//! Submitted content becomes a [`SummaryRequest`] and a pending [`Summary`].
//! A background [`SummarizationQueue`] attaches a derived text, moderators
//! approve or reject, edit with optimistic versioning, and attach
//! [`ResourceLink`]s. Reads of single summaries go through the cache-aside
//! store from `factnotes-cache`.

pub mod error;
pub mod links;
pub mod memory;
pub mod status;
pub mod store;
pub mod summarizer;
pub mod summary;
pub mod validation;
pub mod workflow;

pub use error::ModerationError;
pub use links::ResourceLinkRegistry;
pub use memory::InMemorySummaryStore;
pub use status::{ModerationAction, ParseNameError, SummaryStatus};
pub use store::SummaryStore;
pub use summarizer::{
    ScheduleError, SummarizationConfig, SummarizationJob, SummarizationQueue, SummarizationSink,
    Summarizer, SummarizerError, SummaryScheduler,
};
pub use summary::{
    ModerationDecision, ResourceLink, Summary, SummaryDetail, SummaryEdit, SummaryRequest,
};
pub use workflow::ModerationWorkflow;
