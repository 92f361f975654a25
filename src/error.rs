//! Error types for regwatch.
//!
//! All errors are strongly typed using thiserror. The taxonomy mirrors the
//! phases of a monitor check: fetch, extract, and persistence. Errors for
//! one target are always isolated — they surface in that target's
//! `ChangeReport` and never abort a multi-target run.

use thiserror::Error;

/// Network-level failures while retrieving a target's content.
///
/// Fetch errors are recoverable: the caller retries on the next scheduled
/// cycle, never within the same cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Fetch timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("HTTP error status {status}")]
    Http {
        status: u16,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
    },

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: String,
    },
}

/// Failures while turning fetched content into entities and facets.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed content: {reason}")]
    MalformedContent {
        reason: String,
    },

    #[error("No extractable content in response")]
    NoContent,

    #[error("Facet pattern '{facet}' failed: {reason}")]
    Pattern {
        facet: String,
        reason: String,
    },
}

/// Failures against the snapshot/seen-set persistence backend.
///
/// A write failure is never silently treated as success; the check cycle
/// that hit it is reported as degraded even when the diff itself succeeded.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on key '{key}': {message}")]
    Io {
        key: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record for key '{key}': {reason}")]
    Corrupt {
        key: String,
        reason: String,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Top-level error type for regwatch operations.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl WatchError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a fetch error.
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    /// Returns true if this is an extract error.
    #[must_use]
    pub const fn is_extract(&self) -> bool {
        matches!(self, Self::Extract(_))
    }

    /// Returns true if this is a store error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if a later cycle may succeed without operator action.
    ///
    /// Fetch and extract failures are transient by nature (source outages,
    /// temporarily malformed pages). Corrupt persisted records need an
    /// explicit reset.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Extract(_) => true,
            Self::Store(e) => !matches!(e, StoreError::Corrupt { .. }),
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for regwatch operations.
pub type WatchResult<T> = Result<T, WatchError>;
