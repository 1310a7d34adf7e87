//! Core types for gridfetch

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Lifecycle status of a submitted extraction job
///
/// The four service-defined states are modeled exactly; `Unknown` is a
/// client-only pseudo-state for status strings outside the known set, treated
/// as non-terminal and retried up to the transient-failure bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the service, waiting to be scheduled
    Queued,
    /// Being processed
    Active,
    /// Finished successfully; a result descriptor is available
    Complete,
    /// The service reports the job failed
    Failed,
    /// Status string not in the known set
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Map a service status string to a status, `Unknown` for anything
    /// outside the known set.
    pub fn parse(status: &str) -> Self {
        match status {
            "queued" => JobStatus::Queued,
            "active" => JobStatus::Active,
            "complete" => JobStatus::Complete,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }

    /// Whether no further polling occurs in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// The lowercase wire name of this status (`"unknown"` for the
    /// client-only pseudo-state)
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Active => "active",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One server-side execution of a submitted extraction request
///
/// Created empty at submission time, populated with its href on success, and
/// discarded when the engine call returns. Jobs never persist across engine
/// invocations.
#[derive(Clone, Debug)]
pub struct Job {
    /// Service-assigned URL identifying this job, stable for its life
    pub href: Url,
    /// Current lifecycle status, mutated only by the poll loop
    pub status: JobStatus,
    /// Bytes of the artifact already retrieved; monotonically non-decreasing,
    /// used to resume partial downloads via ranged requests
    pub offset: u64,
    /// Number of transient-failure retries performed while polling
    pub retry_count: u32,
    /// Most recent service-supplied message, if any
    pub last_message: Option<String>,
}

impl Job {
    pub(crate) fn new(href: Url, status: JobStatus) -> Self {
        Self {
            href,
            status,
            offset: 0,
            retry_count: 0,
            last_message: None,
        }
    }
}

/// Location and size of a completed job's artifact, as reported by the
/// service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDescriptor {
    /// Artifact location, resolved against the API base when relative
    #[serde(alias = "href")]
    pub location: String,
    /// Artifact size in bytes; when present, downloads are verified against
    /// it
    #[serde(default)]
    pub size: Option<u64>,
}

/// What a successful [`retrieve`](crate::GridFetchClient::retrieve) produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrieveOutcome {
    /// Local path the artifact was written to
    pub path: PathBuf,
    /// Total bytes written
    pub bytes_written: u64,
}

/// An ordered mapping of field name to value, forwarded verbatim in the
/// submission body
///
/// The engine never interprets the fields except for `target`, which names
/// the local destination file. Values are scalars or sequences of scalars.
///
/// # Example
///
/// ```
/// use gridfetch::ExtractionRequest;
///
/// let request = ExtractionRequest::new()
///     .field("levels", vec!["500", "850"])
///     .field("target", "out.grib");
/// assert_eq!(request.target(), Some("out.grib"));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionRequest(serde_json::Map<String, serde_json::Value>);

/// Request key naming the local destination file
pub const TARGET_FIELD: &str = "target";

impl ExtractionRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value for the same name
    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// The `target` field, when present and a string
    pub fn target(&self) -> Option<&str> {
        self.0.get(TARGET_FIELD).and_then(|v| v.as_str())
    }

    /// Whether the request has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ExtractionRequest {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_strings() {
        assert_eq!(JobStatus::parse("queued"), JobStatus::Queued);
        assert_eq!(JobStatus::parse("active"), JobStatus::Active);
        assert_eq!(JobStatus::parse("complete"), JobStatus::Complete);
        assert_eq!(JobStatus::parse("failed"), JobStatus::Failed);
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        assert_eq!(JobStatus::parse("archiving"), JobStatus::Unknown);
        assert_eq!(JobStatus::parse(""), JobStatus::Unknown);
        assert_eq!(JobStatus::parse("COMPLETE"), JobStatus::Unknown);
    }

    #[test]
    fn only_complete_and_failed_are_terminal() {
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Active.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn request_serializes_in_insertion_order() {
        let request = ExtractionRequest::new()
            .field("zulu", "1")
            .field("alpha", "2")
            .field("target", "out.grib");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"zulu":"1","alpha":"2","target":"out.grib"}"#);
    }

    #[test]
    fn request_accepts_sequences_of_scalars() {
        let request = ExtractionRequest::new().field("levels", vec![500, 850]);
        assert_eq!(
            request.get("levels"),
            Some(&serde_json::json!([500, 850]))
        );
    }

    #[test]
    fn target_requires_a_string_value() {
        let request = ExtractionRequest::new().field("target", 42);
        assert_eq!(request.target(), None);
    }

    #[test]
    fn result_descriptor_accepts_href_alias() {
        let descriptor: ResultDescriptor =
            serde_json::from_str(r#"{"href":"/results/abc.grib","size":1024}"#).unwrap();
        assert_eq!(descriptor.location, "/results/abc.grib");
        assert_eq!(descriptor.size, Some(1024));
    }

    #[test]
    fn result_descriptor_size_is_optional() {
        let descriptor: ResultDescriptor =
            serde_json::from_str(r#"{"location":"/results/abc.grib"}"#).unwrap();
        assert_eq!(descriptor.size, None);
    }
}
