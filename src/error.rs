//! Error types for the reconstruction library.
//!
//! Backend failures are split into retryable and terminal kinds so the retry
//! loop can decide what to re-run. Layout failures never leave the layout
//! module: page reconstruction catches them and falls back to single-stream
//! ordering.

use std::time::Duration;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a recognition backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// Network hiccup, timeout or 5xx response
    #[error("Transient backend error: {0}")]
    Transient(String),

    /// Backend asked us to slow down
    #[error("Backend rate limit: {0}")]
    RateLimited(String),

    /// 4xx response, malformed image or otherwise unrecoverable request
    #[error("Backend rejected request: {0}")]
    Terminal(String),

    /// Asynchronous operation reported an explicit failure status
    #[error("Recognition operation failed: {0}")]
    OperationFailed(String),

    /// Asynchronous operation did not complete within the wait budget
    #[error("Recognition operation timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Whether the call is worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_) | BackendError::RateLimited(_))
    }
}

/// Error types that can occur while reconstructing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A page's recognition call failed without retry
    #[error("Recognition failed for page {page}: {source}")]
    Recognition {
        /// Page whose call failed
        page: u32,
        /// Backend error
        #[source]
        source: BackendError,
    },

    /// A page's recognition call kept failing with retryable errors
    #[error("Recognition for page {page} gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Page whose call failed
        page: u32,
        /// Number of attempts made
        attempts: u32,
        /// Last backend error
        #[source]
        source: BackendError,
    },

    /// An asynchronous operation ran past its wait budget
    #[error("Recognition for page {page} timed out after {waited:?}")]
    OperationTimeout {
        /// Page whose operation timed out
        page: u32,
        /// Time spent waiting
        waited: Duration,
    },

    /// A worker task panicked or was cancelled
    #[error("Recognition worker for page {page} did not complete")]
    WorkerFailed {
        /// Page the worker was processing
        page: u32,
    },

    /// Configuration value is missing or out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Internal layout failure; caught by page reconstruction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// No rows to reorder
    #[error("No rows to lay out")]
    EmptyLayout,

    /// A box with NaN or infinite edges reached the reorderer
    #[error("Non-finite geometry in row {0}")]
    NonFiniteGeometry(usize),
}

/// A word whose computed span does not reproduce its text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Offset mismatch on page {page}, word {order}: expected {expected:?}, found {found:?}")]
pub struct OffsetMismatch {
    /// Page of the word
    pub page: u32,
    /// Reading-order position of the word
    pub order: usize,
    /// Word text
    pub expected: String,
    /// Text found at the recorded span, if the span was in range
    pub found: Option<String>,
}
