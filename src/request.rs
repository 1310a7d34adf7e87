//! Request builders for the service's submission endpoints
//!
//! The engine never needs to know which dataset class built a request; it
//! only needs the submission path. Dataset-specific convenience wrappers
//! implement [`RequestBuilder`] and the façade consumes the capability.

/// Capability implemented by every dataset-class variant
pub trait RequestBuilder {
    /// Path of the submission collection, relative to the API base
    /// (no leading slash)
    fn submit_path(&self) -> String;
}

/// Requests against a named public dataset
#[derive(Clone, Debug)]
pub struct DatasetRequest {
    dataset: String,
}

impl DatasetRequest {
    /// Build requests for the dataset with the given name
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
        }
    }

    /// The dataset name
    pub fn dataset(&self) -> &str {
        &self.dataset
    }
}

impl RequestBuilder for DatasetRequest {
    fn submit_path(&self) -> String {
        format!("datasets/{}/requests", self.dataset)
    }
}

/// Requests against a named processing service
#[derive(Clone, Debug)]
pub struct ServiceRequest {
    service: String,
}

impl ServiceRequest {
    /// Build requests for the service with the given name
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// The service name
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl RequestBuilder for ServiceRequest {
    fn submit_path(&self) -> String {
        format!("services/{}/requests", self.service)
    }
}
