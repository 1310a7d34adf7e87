//! Error types for gridfetch
//!
//! This module provides the error taxonomy for the client engine:
//! - Configuration errors (explicit credential sources that are malformed)
//! - Submission rejections carrying the service's own diagnostic text
//! - Transient vs. permanent transport failures
//! - Job and download failures
//! - Caller-initiated cancellation

use thiserror::Error;

/// Result type alias for gridfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gridfetch
///
/// Every escalated failure is also written to the configured log sink before
/// it is returned, so progress and failure are observable even when the
/// caller does not inspect the error value.
#[derive(Debug, Error)]
pub enum Error {
    /// An explicitly requested credential source is present but malformed or
    /// incomplete. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller-supplied request is unusable before it ever reaches the
    /// service (empty mapping, missing `target` field).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service rejected the submission. Carries the service's error body
    /// text verbatim.
    #[error("submission rejected: {0}")]
    Submission(String),

    /// A transient transport failure: connection error, timeout, HTTP 5xx or
    /// 429. Retried per the back-off policy up to a bound.
    #[error("transient transport failure: {message}")]
    TransientTransport {
        /// HTTP status code, when the failure had one (None for
        /// connection-level errors)
        status: Option<u16>,
        /// Human-readable description of the failure
        message: String,
    },

    /// A permanent transport or protocol failure: a non-retryable HTTP
    /// status, an `error` field in the response body, or a response the
    /// client cannot proceed with.
    #[error("transport failure: {message}")]
    Transport {
        /// HTTP status code, when the failure had one
        status: Option<u16>,
        /// Human-readable description of the failure
        message: String,
    },

    /// The bounded number of consecutive transient failures was exceeded.
    #[error("retries exhausted after {attempts} consecutive failures: {last}")]
    RetryExhausted {
        /// Number of consecutive failed attempts
        attempts: u32,
        /// Description of the last failure observed
        last: String,
    },

    /// The service reports that the job itself failed. Carries the service
    /// diagnostic text.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// The number of bytes streamed to disk does not match the size the
    /// service reported. Fatal unless the caller explicitly resumes.
    #[error("download incomplete: wrote {written} of {expected} bytes")]
    DownloadIncomplete {
        /// Size the service reported for the artifact
        expected: u64,
        /// Bytes actually written to the destination
        written: u64,
    },

    /// The caller signalled abort during polling or download.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
