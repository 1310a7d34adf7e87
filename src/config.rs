//! Configuration types for gridfetch

use crate::retry::BackoffPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for [`GridFetchClient`](crate::GridFetchClient)
///
/// All fields have sensible defaults; `ClientConfig::default()` is a working
/// configuration. Credentials are not part of the config; they are resolved
/// separately (see [`crate::credentials`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// TCP connect timeout for every outbound call (default: 30s)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Total per-request timeout for submission and status calls
    /// (default: 60s)
    ///
    /// Artifact downloads are exempt: a multi-gigabyte transfer legitimately
    /// runs longer than any fixed request timeout, so downloads are bounded
    /// by the connect timeout and cancellation only.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Back-off schedule between poll attempts
    #[serde(default)]
    pub poll: BackoffPolicy,

    /// Maximum consecutive transient failures (or unrecognized statuses)
    /// before the poll loop gives up (default: 10)
    #[serde(default = "default_max_transient_failures")]
    pub max_transient_failures: u32,

    /// Suppress service-supplied informational messages from the log sink
    /// (default: false)
    #[serde(default)]
    pub quiet: bool,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_transient_failures() -> u32 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            poll: BackoffPolicy::default(),
            max_transient_failures: default_max_transient_failures(),
            quiet: false,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.max_transient_failures, 10);
        assert!(!config.quiet);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_transient_failures, 10);
        assert_eq!(config.poll, BackoffPolicy::default());
    }
}
