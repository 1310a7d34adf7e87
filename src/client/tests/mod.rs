//! Client tests against a simulated service.


use crate::client::GridFetchClient;
use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::log_sink::LogSink;
use crate::retry::BackoffPolicy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::{Request, Respond, ResponseTemplate};

/// Sink that records every emitted line for assertions.
pub(crate) struct VecSink(Mutex<Vec<String>>);

impl VecSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Vec::new())))
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl LogSink for VecSink {
    fn emit(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

/// Zero-delay poll schedule so tests never sleep.
pub(crate) fn test_config() -> ClientConfig {
    ClientConfig {
        poll: BackoffPolicy::none(),
        ..ClientConfig::default()
    }
}

pub(crate) fn client_for(uri: &str, config: ClientConfig) -> GridFetchClient {
    let credentials = Credentials {
        url: uri.to_string(),
        key: "test-key".to_string(),
        email: "tester@example.com".to_string(),
    };
    GridFetchClient::with_credentials(config, credentials).unwrap()
}

/// Responds with each template in turn, repeating the last one once the
/// sequence is exhausted.
pub(crate) struct ResponseSequence {
    templates: Vec<ResponseTemplate>,
    hits: AtomicUsize,
}

impl ResponseSequence {
    pub(crate) fn new(templates: Vec<ResponseTemplate>) -> Self {
        Self {
            templates,
            hits: AtomicUsize::new(0),
        }
    }
}

impl Respond for ResponseSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let i = self.hits.fetch_add(1, Ordering::SeqCst);
        self.templates[i.min(self.templates.len() - 1)].clone()
    }
}

pub(crate) fn status_response(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": status }))
}

pub(crate) fn complete_response(location: &str, size: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "complete",
        "result": { "location": location, "size": size },
    }))
}
