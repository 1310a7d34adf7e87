//! Authenticated transport
//!
//! Wraps the raw HTTP client with credential headers and uniform response
//! decoding. Every outbound call, polls included, carries the resolved
//! credentials. Failures come back classified: connection errors, timeouts,
//! HTTP 5xx and 429 are transient; every other 4xx is permanent. An `error`
//! field inside an otherwise-OK body is surfaced for the caller to judge,
//! since its meaning depends on the operation in flight.

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use reqwest::{Method, header};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Header carrying the API key on every call
pub(crate) const KEY_HEADER: &str = "X-Gridfetch-Key";

/// Decoded response from an API call
#[derive(Debug)]
pub(crate) struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body, when the response carried one
    pub body: Option<Value>,
    /// `Location` header resolved against the request URL
    pub location: Option<Url>,
    /// Service poll-interval hint from the `Retry-After` header
    pub retry_after: Option<Duration>,
}

impl ApiResponse {
    /// String value of a top-level body field
    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body.as_ref()?.get(field)?.as_str()
    }

    /// Service error text carried in an otherwise-OK body, if any
    ///
    /// The service reports some rejections inside a 2xx body rather than
    /// through the status code; callers decide what such an error means for
    /// the operation in flight.
    pub fn error_text(&self) -> Option<String> {
        let err = self.body.as_ref()?.get("error")?;
        Some(
            err.as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
        )
    }
}

/// HTTP transport bound to one set of credentials and one API base
pub(crate) struct ApiTransport {
    client: reqwest::Client,
    credentials: Credentials,
    base: Url,
    request_timeout: Duration,
}

impl ApiTransport {
    pub fn new(credentials: Credentials, config: &ClientConfig) -> Result<Self> {
        let base = Url::parse(&credentials.url).map_err(|e| {
            Error::Configuration(format!("invalid API url '{}': {e}", credentials.url))
        })?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            credentials,
            base,
            request_timeout: config.request_timeout,
        })
    }

    /// The API base URL the credentials were issued for
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a path relative to the API base
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| Error::Configuration(format!("invalid endpoint '{joined}': {e}")))
    }

    /// Resolve a service-supplied location (absolute or relative) against
    /// the API base
    pub fn resolve(&self, location: &str) -> Result<Url> {
        self.base.join(location).map_err(|e| Error::Transport {
            status: None,
            message: format!("service returned an unusable location '{location}': {e}"),
        })
    }

    /// The underlying HTTP client, for streaming transfers
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Attach the credential headers required on every outbound call
    pub fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(header::ACCEPT, "application/json")
            .header(header::FROM, &self.credentials.email)
            .header(KEY_HEADER, &self.credentials.key)
    }

    /// Perform one authenticated call and decode the response
    ///
    /// The per-request timeout covers the whole exchange; this path is for
    /// the small submission/status/cleanup calls, not artifact streaming.
    pub async fn call(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        tracing::debug!(%method, %url, "calling service");

        let mut request = self
            .authed(self.client.request(method, url.clone()))
            .timeout(self.request_timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify_send_error)?;

        let status = response.status();
        let code = status.as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|l| url.join(l).ok());

        if status.is_server_error() || code == 429 {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<Value>(&text).ok();
            return Err(Error::TransientTransport {
                status: Some(code),
                message: service_error_text(code, body.as_ref(), &text),
            });
        }

        let text = response.text().await?;
        let body: Option<Value> = if code == 204 || text.is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };

        if !status.is_success() {
            return Err(Error::Transport {
                status: Some(code),
                message: service_error_text(code, body.as_ref(), &text),
            });
        }

        tracing::debug!(status = code, "service responded");

        Ok(ApiResponse {
            status: code,
            body,
            location,
            retry_after,
        })
    }
}

/// Classify reqwest send failures: connection errors and timeouts are
/// transient, everything else surfaces as a network error.
pub(crate) fn classify_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::TransientTransport {
            status: None,
            message: e.to_string(),
        }
    } else {
        Error::Network(e)
    }
}

fn service_error_text(code: u16, body: Option<&Value>, raw: &str) -> String {
    if let Some(err) = body.and_then(|b| b.get("error")) {
        return err
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
    }
    let raw = raw.trim();
    if raw.is_empty() {
        format!("HTTP {code}")
    } else {
        format!("HTTP {code}: {raw}")
    }
}
