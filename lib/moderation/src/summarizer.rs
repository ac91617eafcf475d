//! Background summarization.
//!
//! Submissions enqueue a [`SummarizationJob`] on a bounded channel. A fixed
//! pool of workers drains it, calls the [`Summarizer`] with retry and
//! exponential backoff, and hands the text to a [`SummarizationSink`].
//! A job that never succeeds leaves its summary pending.

use crate::error::ModerationError;
use async_trait::async_trait;
use factnotes_core::{SummaryId, SummaryRequestId};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Work item for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizationJob {
    pub request_id: SummaryRequestId,
    pub summary_id: SummaryId,
    pub content: String,
    pub metadata: String,
}

/// Errors from a summarizer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizerError {
    /// The summarizer could not be reached or failed transiently.
    Unavailable { details: String },
    /// The summarizer refused the input; retrying will not help.
    Rejected { details: String },
}

impl SummarizerError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl fmt::Display for SummarizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "summarizer unavailable: {details}"),
            Self::Rejected { details } => write!(f, "summarizer rejected input: {details}"),
        }
    }
}

impl std::error::Error for SummarizerError {}

/// Produces a short derived text for submitted content.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, content: &str, metadata: &str) -> Result<String, SummarizerError>;
}

/// Receives finished summaries.
#[async_trait]
pub trait SummarizationSink: Send + Sync {
    /// Attaches `text` to the summary. Returns false if the summary had
    /// already left the pending state.
    async fn complete(&self, summary_id: SummaryId, text: String) -> Result<bool, ModerationError>;
}

/// Why a job could not be enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    QueueFull,
    Closed,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "summarization queue is full"),
            Self::Closed => write!(f, "summarization queue is closed"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Accepts summarization jobs without waiting.
pub trait SummaryScheduler: Send + Sync {
    /// # Errors
    ///
    /// Returns `QueueFull` under backpressure and `Closed` once the workers
    /// are gone.
    fn schedule(&self, job: SummarizationJob) -> Result<(), ScheduleError>;
}

/// Worker pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizationConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_backoff_millis")]
    pub backoff_millis: u64,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_millis() -> u64 {
    500
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            backoff_millis: default_backoff_millis(),
        }
    }
}

impl SummarizationConfig {
    /// Delay after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_millis.saturating_mul(factor))
    }
}

/// Sending half of the summarization queue.
#[derive(Debug, Clone)]
pub struct SummarizationQueue {
    sender: mpsc::Sender<SummarizationJob>,
}

impl SummarizationQueue {
    /// Creates the queue without workers. Pair with [`Self::spawn_workers`]
    /// once the sink exists.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SummarizationJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Creates the queue and starts its workers.
    pub fn start(
        config: &SummarizationConfig,
        summarizer: Arc<dyn Summarizer>,
        sink: Arc<dyn SummarizationSink>,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (queue, receiver) = Self::channel(config.queue_capacity);
        let workers = Self::spawn_workers(config, receiver, summarizer, sink);
        (queue, workers)
    }

    /// Starts `config.workers` tasks draining `receiver`.
    ///
    /// Workers exit once every queue handle has been dropped and the
    /// remaining jobs are done.
    pub fn spawn_workers(
        config: &SummarizationConfig,
        receiver: mpsc::Receiver<SummarizationJob>,
        summarizer: Arc<dyn Summarizer>,
        sink: Arc<dyn SummarizationSink>,
    ) -> Vec<JoinHandle<()>> {
        let receiver = Arc::new(Mutex::new(receiver));
        (0..config.workers.max(1))
            .map(|worker| {
                let receiver = receiver.clone();
                let summarizer = summarizer.clone();
                let sink = sink.clone();
                let config = config.clone();
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(job) = next else {
                            debug!(worker, "summarization queue closed");
                            break;
                        };
                        process(&config, summarizer.as_ref(), sink.as_ref(), job).await;
                    }
                })
            })
            .collect()
    }
}

impl SummaryScheduler for SummarizationQueue {
    fn schedule(&self, job: SummarizationJob) -> Result<(), ScheduleError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ScheduleError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ScheduleError::Closed,
        })
    }
}

async fn process(
    config: &SummarizationConfig,
    summarizer: &dyn Summarizer,
    sink: &dyn SummarizationSink,
    job: SummarizationJob,
) {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    let text = loop {
        match summarizer.summarize(&job.content, &job.metadata).await {
            Ok(text) => break text,
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = config.backoff(attempt);
                warn!(
                    summary_id = %job.summary_id,
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "summarization failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    summary_id = %job.summary_id,
                    request_id = %job.request_id,
                    attempt,
                    error = %e,
                    "summarization gave up, summary stays pending"
                );
                return;
            }
        }
    };

    match sink.complete(job.summary_id, text).await {
        Ok(true) => info!(summary_id = %job.summary_id, attempt, "summary ai-reviewed"),
        Ok(false) => debug!(
            summary_id = %job.summary_id,
            "summary already moderated, dropping summarizer output"
        ),
        Err(e) => error!(summary_id = %job.summary_id, error = %e, "failed to store summarizer output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        error: SummarizerError,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32, error: SummarizerError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Summarizer for Flaky {
        async fn summarize(&self, content: &str, _: &str) -> Result<String, SummarizerError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(self.error.clone());
            }
            Ok(format!("tl;dr {content}"))
        }
    }

    #[derive(Default)]
    struct Recording {
        completed: std::sync::Mutex<Vec<(SummaryId, String)>>,
    }

    #[async_trait]
    impl SummarizationSink for Recording {
        async fn complete(&self, summary_id: SummaryId, text: String) -> Result<bool, ModerationError> {
            self.completed
                .lock()
                .expect("lock")
                .push((summary_id, text));
            Ok(true)
        }
    }

    fn config(max_attempts: u32) -> SummarizationConfig {
        SummarizationConfig {
            workers: 2,
            queue_capacity: 8,
            max_attempts,
            backoff_millis: 1,
        }
    }

    fn job() -> SummarizationJob {
        SummarizationJob {
            request_id: SummaryRequestId::new(),
            summary_id: SummaryId::new(),
            content: "the claim".to_string(),
            metadata: "{}".to_string(),
        }
    }

    fn unavailable() -> SummarizerError {
        SummarizerError::Unavailable {
            details: "timeout".to_string(),
        }
    }

    async fn drain(queue: SummarizationQueue, workers: Vec<JoinHandle<()>>) {
        drop(queue);
        for worker in workers {
            worker.await.expect("worker");
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let summarizer = Arc::new(Flaky::new(2, unavailable()));
        let sink = Arc::new(Recording::default());
        let (queue, workers) = SummarizationQueue::start(&config(3), summarizer.clone(), sink.clone());

        let job = job();
        queue.schedule(job.clone()).expect("schedule");
        drain(queue, workers).await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 3);
        let completed = sink.completed.lock().expect("lock");
        assert_eq!(completed.as_slice(), &[(job.summary_id, "tl;dr the claim".to_string())]);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let summarizer = Arc::new(Flaky::new(u32::MAX, unavailable()));
        let sink = Arc::new(Recording::default());
        let (queue, workers) = SummarizationQueue::start(&config(3), summarizer.clone(), sink.clone());

        queue.schedule(job()).expect("schedule");
        drain(queue, workers).await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 3);
        assert!(sink.completed.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn rejected_input_is_not_retried() {
        let rejected = SummarizerError::Rejected {
            details: "too long".to_string(),
        };
        let summarizer = Arc::new(Flaky::new(u32::MAX, rejected));
        let sink = Arc::new(Recording::default());
        let (queue, workers) = SummarizationQueue::start(&config(5), summarizer.clone(), sink.clone());

        queue.schedule(job()).expect("schedule");
        drain(queue, workers).await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn full_queue_reports_backpressure() {
        let (queue, _receiver) = SummarizationQueue::channel(1);
        queue.schedule(job()).expect("first fits");
        assert_eq!(queue.schedule(job()), Err(ScheduleError::QueueFull));
    }

    #[test]
    fn closed_queue_is_reported() {
        let (queue, receiver) = SummarizationQueue::channel(1);
        drop(receiver);
        assert_eq!(queue.schedule(job()), Err(ScheduleError::Closed));
    }

    #[test]
    fn backoff_doubles() {
        let config = SummarizationConfig {
            backoff_millis: 100,
            ..SummarizationConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
    }
}
