//! The fetch boundary.
//!
//! The core treats content retrieval as an opaque collaborator: a `Fetcher`
//! turns a target's endpoint into raw text or a typed `FetchError`. It does
//! not interpret HTTP status codes beyond success/failure, and it never
//! retries within a cycle — retry cadence is a scheduling concern.

#[cfg(feature = "http")]
use std::time::Duration;

use crate::error::FetchError;

/// Raw content retrieved for one target.
#[derive(Debug, Clone)]
pub struct RawContent {
    /// The fetched body as text (HTML, RSS/XML, or a JSON API response).
    pub text: String,

    /// Content type reported by the source, when known.
    pub content_type: Option<String>,
}

impl RawContent {
    /// Wraps plain text with no content type.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            content_type: None,
        }
    }
}

/// Retrieves raw content for one endpoint.
pub trait Fetcher: Send + Sync {
    /// Fetches the content behind `endpoint`.
    fn fetch(&self, endpoint: &str) -> Result<RawContent, FetchError>;
}

/// Blocking HTTP fetcher with a bounded timeout.
///
/// Sends a browser-like User-Agent; several regulatory sites refuse
/// default library agents.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// User-Agent sent with every request.
    pub const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

    /// Creates a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }

    /// The per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(feature = "http")]
impl Fetcher for HttpFetcher {
    fn fetch(&self, endpoint: &str) -> Result<RawContent, FetchError> {
        let response = self.client.get(endpoint).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    duration_ms: self.timeout.as_millis() as u64,
                }
            } else if e.is_builder() || e.is_request() {
                FetchError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            } else {
                FetchError::Network {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let text = response.text().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    duration_ms: self.timeout.as_millis() as u64,
                }
            } else {
                FetchError::Network {
                    message: format!("failed to read response body: {e}"),
                }
            }
        })?;

        Ok(RawContent {
            text,
            content_type,
        })
    }
}
