//! # gridfetch
//!
//! Client library for asynchronous batch data-extraction services.
//!
//! A caller submits a structured request describing a dataset to extract,
//! the service processes it asynchronously, and the client polls for
//! completion and streams the resulting artifact to local storage.
//!
//! ## Design Philosophy
//!
//! gridfetch is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Deterministic** - Credential resolution is a pure function over
//!   injected sources; the back-off schedule is an injected policy value
//! - **Observable** - Progress and every failure flow through a pluggable
//!   single-line log sink
//! - **Honest about failure** - Errors come back classified: transient
//!   transport trouble is retried within a bound, everything else is
//!   surfaced, and a short download is never reported as success
//!
//! ## Quick Start
//!
//! ```no_run
//! use gridfetch::{ClientConfig, DatasetRequest, ExtractionRequest, GridFetchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GridFetchClient::new(ClientConfig::default())?;
//!
//!     let request = ExtractionRequest::new()
//!         .field("variable", "2m_temperature")
//!         .field("date", "2024-01-01/to/2024-01-31")
//!         .field("target", "january.grib");
//!
//!     let outcome = client
//!         .retrieve(&DatasetRequest::new("reanalysis-daily"), &request)
//!         .await?;
//!
//!     println!("wrote {} bytes", outcome.bytes_written);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Client façade: submission, polling, artifact retrieval
pub mod client;
/// Configuration types
pub mod config;
/// Credential resolution
pub mod credentials;
/// Error types
pub mod error;
/// Pluggable progress logging
pub mod log_sink;
/// Request builders for the service's submission endpoints
pub mod request;
/// Back-off policy and failure classification
pub mod retry;
/// Core types
pub mod types;

mod transport;

// Re-export commonly used types
pub use client::GridFetchClient;
pub use config::ClientConfig;
pub use credentials::{Credentials, EnvSource, FileSource, resolve_credentials};
pub use error::{Error, Result};
pub use log_sink::{LogSink, NullSink, StdoutSink};
pub use request::{DatasetRequest, RequestBuilder, ServiceRequest};
pub use retry::{BackoffPolicy, IsRetryable};
pub use types::{ExtractionRequest, Job, JobStatus, ResultDescriptor, RetrieveOutcome};
