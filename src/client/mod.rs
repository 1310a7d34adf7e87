//! Client façade split into focused submodules.
//!
//! The `GridFetchClient` struct and its methods are organized by domain:
//! - [`job`] - Submission and the poll loop
//! - [`transfer`] - Artifact streaming and resume

mod job;
mod transfer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::log_sink::{LogSink, StdoutSink};
use crate::request::RequestBuilder;
use crate::transport::ApiTransport;
use crate::types::{ExtractionRequest, RetrieveOutcome, TARGET_FIELD};
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Client engine for one batch data-extraction service
///
/// Credentials are resolved once, at construction, and every outbound call
/// carries them. An instance drives a single logical job at a time; run one
/// instance per concurrent job if needed; nothing is shared between
/// instances.
pub struct GridFetchClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: ApiTransport,
    pub(crate) sink: Arc<dyn LogSink>,
    cancel: CancellationToken,
}

impl GridFetchClient {
    /// Create a client, resolving credentials from the environment, an
    /// rc file, or the anonymous fallback (see [`crate::credentials`]).
    pub fn new(config: ClientConfig) -> Result<Self> {
        let credentials = Credentials::resolve()?;
        Self::with_credentials(config, credentials)
    }

    /// Create a client with explicit credentials, skipping resolution.
    pub fn with_credentials(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let transport = ApiTransport::new(credentials, &config)?;
        Ok(Self {
            config,
            transport,
            sink: Arc::new(StdoutSink),
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the progress log sink (default: timestamped standard output).
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Token that aborts the in-flight operation when cancelled.
    ///
    /// Cancellation lands within one back-off tick: the poll loop checks the
    /// token before every network call and every sleep, and the download
    /// stream checks it between chunks. A cancelled client stays cancelled;
    /// use a fresh instance for the next job.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit a request, poll until the job is terminal, and stream the
    /// artifact to the file named by the request's `target` field.
    ///
    /// The target is created or truncated, so a stale file is never mistaken
    /// for a resumable partial. Exactly one download attempt is made; on
    /// [`Error::DownloadIncomplete`] the caller may
    /// [`resume`](GridFetchClient::resume) explicitly.
    pub async fn retrieve<B: RequestBuilder + ?Sized>(
        &self,
        builder: &B,
        request: &ExtractionRequest,
    ) -> Result<RetrieveOutcome> {
        let target = match request.target() {
            Some(target) => PathBuf::from(target),
            None => {
                return self.fail(Error::InvalidRequest(format!(
                    "request must include a string `{TARGET_FIELD}` field"
                )));
            }
        };

        self.sink.emit(&format!(
            "gridfetch {} at {}",
            env!("CARGO_PKG_VERSION"),
            self.transport.base()
        ));

        let mut job = match self.submit(builder, request).await {
            Ok(job) => job,
            Err(e) => return self.fail(e),
        };
        let result = match self.poll_until_terminal(&mut job).await {
            Ok(result) => result,
            Err(e) => return self.fail(e),
        };
        let bytes_written = match self.download(&mut job, &result, &target).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(e),
        };

        // Best-effort job cleanup; the artifact is already on disk
        if let Err(e) = self.transport.call(Method::DELETE, &job.href, None).await {
            tracing::debug!(error = %e, "job cleanup failed");
        }

        Ok(RetrieveOutcome {
            path: target,
            bytes_written,
        })
    }

    /// Log an escalated failure through the sink before returning it.
    fn fail<T>(&self, error: Error) -> Result<T> {
        self.sink.emit(&format!("ERROR: {error}"));
        Err(error)
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `delay`, exiting promptly with [`Error::Cancelled`] if the
    /// caller signals abort mid-wait.
    pub(crate) async fn sleep_or_cancelled(&self, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return self.check_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
