//! Job lifecycle: submission and the status poll loop.
//!
//! A job moves forward only: submitted, then queued/active while the service
//! works, then complete or failed. Once a terminal status is observed, no
//! further status fetches are made for that job.

use super::GridFetchClient;
use crate::error::{Error, Result};
use crate::log_sink::{format_bytes, format_elapsed};
use crate::request::RequestBuilder;
use crate::retry::IsRetryable;
use crate::transport::ApiResponse;
use crate::types::{ExtractionRequest, Job, JobStatus, ResultDescriptor};
use reqwest::Method;
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

impl GridFetchClient {
    /// Send the request payload to the service's submission endpoint and
    /// create the job from the location it assigns.
    ///
    /// Transient transport failures are retried per the back-off policy up
    /// to the configured bound; a permanent rejection surfaces as
    /// [`Error::Submission`] carrying the service's own error text.
    pub async fn submit<B: RequestBuilder + ?Sized>(
        &self,
        builder: &B,
        request: &ExtractionRequest,
    ) -> Result<Job> {
        if request.is_empty() {
            return Err(Error::InvalidRequest("request has no fields".to_string()));
        }

        let url = self.transport.endpoint(&builder.submit_path())?;
        let payload = serde_json::to_value(request)?;

        let response = match self.call_with_retry(Method::POST, &url, Some(&payload)).await {
            Ok(response) => response,
            // A permanent rejection at submission time is a submission
            // error carrying the service's own text
            Err(Error::Transport { message, .. }) => return Err(Error::Submission(message)),
            Err(e) => return Err(e),
        };

        if let Some(message) = response.error_text() {
            return Err(Error::Submission(message));
        }

        let href = self.job_href(&url, &response).ok_or_else(|| {
            Error::Submission("service did not return a job location".to_string())
        })?;

        self.sink.emit("request submitted");
        if let Some(name) = response.body_str("name") {
            self.sink.emit(&format!("request id: {name}"));
        }
        let status = response
            .body_str("status")
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::Queued);
        self.sink.emit(&format!("request is {status}"));
        tracing::info!(href = %href, %status, "job submitted");

        Ok(Job::new(href, status))
    }

    fn job_href(&self, request_url: &Url, response: &ApiResponse) -> Option<Url> {
        response.location.clone().or_else(|| {
            response
                .body_str("href")
                .and_then(|href| request_url.join(href).ok())
        })
    }

    /// Drive the poll loop until the job reaches a terminal state.
    ///
    /// Non-terminal statuses (queued, active, and anything unrecognized)
    /// wait out the back-off schedule and fetch again. Transient transport
    /// failures are absorbed up to the configured bound of consecutive
    /// failures; unrecognized statuses share the same bound. A service
    /// `Retry-After` hint may lengthen a wait but never shortens it below
    /// the policy, and stays under the cap.
    ///
    /// On `complete` the service's result descriptor is returned and the
    /// job is DONE; on `failed` the service diagnostic surfaces as
    /// [`Error::JobFailed`].
    pub async fn poll_until_terminal(&self, job: &mut Job) -> Result<ResultDescriptor> {
        let policy = &self.config.poll;
        let started = Instant::now();
        let mut attempt: u32 = 0;
        let mut consecutive_failures: u32 = 0;
        let mut hint: Option<Duration> = None;

        loop {
            self.check_cancelled()?;

            match self.transport.call(Method::GET, &job.href, None).await {
                Ok(response) => {
                    hint = response.retry_after;
                    self.forward_messages(&response, job);

                    let status = response
                        .body_str("status")
                        .map(JobStatus::parse)
                        .unwrap_or(JobStatus::Unknown);
                    job.status = status;

                    match status {
                        JobStatus::Complete => {
                            self.sink.emit(&format!(
                                "request is complete ({} elapsed)",
                                format_elapsed(started.elapsed())
                            ));
                            tracing::info!(fetches = attempt + 1, "job complete");
                            return self.result_descriptor(&response);
                        }
                        JobStatus::Failed => {
                            let message = response
                                .error_text()
                                .or_else(|| response.body_str("message").map(str::to_string))
                                .or_else(|| job.last_message.clone())
                                .unwrap_or_else(|| "no diagnostic from the service".to_string());
                            tracing::error!(%message, "job failed");
                            return Err(Error::JobFailed(message));
                        }
                        JobStatus::Queued | JobStatus::Active => {
                            if let Some(message) = response.error_text() {
                                return Err(Error::Transport {
                                    status: Some(response.status),
                                    message,
                                });
                            }
                            consecutive_failures = 0;
                            self.sink.emit(&format!(
                                "request is {status} ({} elapsed)",
                                format_elapsed(started.elapsed())
                            ));
                        }
                        JobStatus::Unknown => {
                            consecutive_failures += 1;
                            job.retry_count += 1;
                            self.sink
                                .emit("service reported an unrecognized status, retrying");
                            tracing::warn!(attempt = consecutive_failures, "unrecognized job status");
                            if consecutive_failures >= self.config.max_transient_failures {
                                return Err(Error::RetryExhausted {
                                    attempts: consecutive_failures,
                                    last: "unrecognized job status".to_string(),
                                });
                            }
                        }
                    }
                }
                Err(e) if e.is_retryable() => {
                    consecutive_failures += 1;
                    job.retry_count += 1;
                    self.sink.emit(&format!(
                        "transient failure contacting the service, retrying: {e}"
                    ));
                    tracing::warn!(error = %e, attempt = consecutive_failures, "transient poll failure");
                    if consecutive_failures >= self.config.max_transient_failures {
                        self.sink.emit(&format!(
                            "giving up after {consecutive_failures} consecutive failures"
                        ));
                        return Err(Error::RetryExhausted {
                            attempts: consecutive_failures,
                            last: e.to_string(),
                        });
                    }
                }
                Err(e) => return Err(e),
            }

            let mut delay = policy.delay_for(attempt);
            if let Some(hint) = hint {
                delay = delay.max(hint.min(policy.max_interval));
            }
            attempt = attempt.saturating_add(1);
            self.sleep_or_cancelled(delay).await?;
        }
    }

    /// One authenticated call with bounded transient-failure retries, used
    /// for submission.
    async fn call_with_retry(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let policy = &self.config.poll;
        let mut failures: u32 = 0;
        loop {
            self.check_cancelled()?;
            match self.transport.call(method.clone(), url, body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    failures += 1;
                    if failures >= self.config.max_transient_failures {
                        self.sink
                            .emit(&format!("giving up after {failures} consecutive failures"));
                        return Err(Error::RetryExhausted {
                            attempts: failures,
                            last: e.to_string(),
                        });
                    }
                    let delay = policy.delay_for(failures - 1);
                    self.sink.emit(&format!(
                        "transient failure contacting the service, retrying in {}: {e}",
                        format_elapsed(delay)
                    ));
                    tracing::warn!(error = %e, attempt = failures, "transient failure, retrying");
                    self.sleep_or_cancelled(delay).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Forward service-supplied informational messages to the log sink and
    /// remember the most recent one as a diagnostic.
    fn forward_messages(&self, response: &ApiResponse, job: &mut Job) {
        let Some(messages) = response
            .body
            .as_ref()
            .and_then(|b| b.get("messages"))
            .and_then(Value::as_array)
        else {
            return;
        };
        for message in messages.iter().filter_map(Value::as_str) {
            if !self.config.quiet {
                self.sink.emit(message);
            }
            job.last_message = Some(message.to_string());
        }
    }

    fn result_descriptor(&self, response: &ApiResponse) -> Result<ResultDescriptor> {
        let result = response
            .body
            .as_ref()
            .and_then(|b| b.get("result"))
            .cloned()
            .ok_or_else(|| Error::Transport {
                status: Some(response.status),
                message: "job completed but the response carried no result descriptor".to_string(),
            })?;
        let descriptor: ResultDescriptor =
            serde_json::from_value(result).map_err(|e| Error::Transport {
                status: Some(response.status),
                message: format!("job completed with an unusable result descriptor: {e}"),
            })?;
        if let Some(size) = descriptor.size {
            self.sink.emit(&format!(
                "result is {} at {}",
                format_bytes(size),
                descriptor.location
            ));
        }
        Ok(descriptor)
    }
}
