//! Back-off policy and failure classification
//!
//! The service is explicitly uncooperative about fast polling, so the wait
//! between attempts starts small and grows linearly up to a capped ceiling.
//! The policy is a plain value injected through [`ClientConfig`](crate::config::ClientConfig),
//! which lets tests substitute a zero-delay schedule.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (connection errors, timeouts, HTTP 5xx/429) should
/// return `true`. Permanent failures (rejected submissions, failed jobs,
/// configuration errors) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::TransientTransport { .. } => true,
            // Errors surfaced by reqwest outside the classified paths
            // (e.g. mid-body failures) follow the same connection/timeout rule
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Linear-then-capped back-off schedule for the poll loop
///
/// The delay before attempt `n` is `initial_interval + n * increment`,
/// capped at `max_interval`. Delays are monotonically non-decreasing up to
/// the cap for any attempt sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the second poll (default: 5s)
    #[serde(default = "default_initial_interval")]
    pub initial_interval: Duration,

    /// Linear growth added per attempt (default: 5s)
    #[serde(default = "default_increment")]
    pub increment: Duration,

    /// Ceiling on the delay (default: 60s)
    #[serde(default = "default_max_interval")]
    pub max_interval: Duration,
}

fn default_initial_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_increment() -> Duration {
    Duration::from_secs(5)
}

fn default_max_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: default_initial_interval(),
            increment: default_increment(),
            max_interval: default_max_interval(),
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait before the attempt following attempt number `attempt`
    /// (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let grown = self
            .increment
            .checked_mul(attempt)
            .and_then(|g| self.initial_interval.checked_add(g))
            .unwrap_or(self.max_interval);
        grown.min(self.max_interval)
    }

    /// A zero-delay schedule, useful in tests.
    pub const fn none() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            increment: Duration::ZERO,
            max_interval: Duration::ZERO,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_are_non_decreasing_and_capped() {
        let policy = BackoffPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 0..1000 {
            let delay = policy.delay_for(attempt);
            assert!(
                delay >= previous,
                "delay for attempt {attempt} ({delay:?}) decreased from {previous:?}"
            );
            assert!(
                delay <= policy.max_interval,
                "delay for attempt {attempt} ({delay:?}) exceeds the cap"
            );
            previous = delay;
        }
    }

    #[test]
    fn default_schedule_grows_linearly_to_the_cap() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Duration::from_secs(15));
        // 5 + 11 * 5 = 60, at the cap
        assert_eq!(policy.delay_for(11), Duration::from_secs(60));
        assert_eq!(policy.delay_for(12), Duration::from_secs(60));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn zero_policy_never_waits() {
        let policy = BackoffPolicy::none();
        for attempt in 0..100 {
            assert_eq!(policy.delay_for(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn cap_below_initial_wins() {
        let policy = BackoffPolicy {
            initial_interval: Duration::from_secs(30),
            increment: Duration::from_secs(5),
            max_interval: Duration::from_secs(10),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(10));
    }

    #[test]
    fn transient_transport_is_retryable() {
        let err = Error::TransientTransport {
            status: Some(503),
            message: "service unavailable".to_string(),
        };
        assert!(err.is_retryable());

        let err = Error::TransientTransport {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!Error::Configuration("bad rc file".into()).is_retryable());
        assert!(!Error::Submission("unknown dataset".into()).is_retryable());
        assert!(!Error::JobFailed("expired data".into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(
            !Error::Transport {
                status: Some(404),
                message: "not found".into()
            }
            .is_retryable()
        );
        assert!(
            !Error::DownloadIncomplete {
                expected: 10,
                written: 9
            }
            .is_retryable()
        );
    }
}
