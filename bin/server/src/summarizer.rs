//! HTTP summarizer client.
//!
//! Posts `{"content", "metadata"}` to the configured endpoint and expects
//! `{"summary": "..."}` back. Server errors and timeouts are retryable;
//! other client errors are not.

use async_trait::async_trait;
use factnotes_moderation::{Summarizer, SummarizerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout for summarizer calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpSummarizer {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpSummarizer {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    content: &'a str,
    metadata: &'a str,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: String,
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, content: &str, metadata: &str) -> Result<String, SummarizerError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&SummarizeRequest { content, metadata })
            .send()
            .await
            .map_err(|e| SummarizerError::Unavailable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizerError::Unavailable {
                details: format!("summarizer returned {status}"),
            });
        }
        if !status.is_success() {
            return Err(SummarizerError::Rejected {
                details: format!("summarizer returned {status}"),
            });
        }

        let body: SummarizeResponse =
            response
                .json()
                .await
                .map_err(|e| SummarizerError::Rejected {
                    details: format!("unexpected response: {e}"),
                })?;
        Ok(body.summary)
    }
}
