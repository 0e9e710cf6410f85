//! Scripted in-memory transport for tests and doc examples.
//!
//! ```
//! use service::transport::mock::MockTransport;
//! use service::transport::{ApiRequest, ApiResponse, StatusCode, Transport};
//!
//! let mock = MockTransport::new(|_| Ok(ApiResponse::empty(StatusCode::NO_CONTENT)));
//! let resp = tokio_test::block_on(mock.send(&ApiRequest::get("/admin/users"))).unwrap();
//! assert_eq!(resp.status, StatusCode::NO_CONTENT);
//! assert_eq!(mock.calls_to("/admin/users"), 1);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiRequest, ApiResponse, Method, RequestBody, Transport, TransportError};

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// What the mock saw for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

pub struct MockTransport {
    handler: Box<Handler>,
    latency: Option<Duration>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self { handler: Box::new(handler), latency: None, log: Mutex::new(Vec::new()) }
    }

    /// Sleep before answering so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.log().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.log().push(RecordedRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            bearer: request.bearer().map(str::to_string),
            body: request.body.clone(),
        });
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        (self.handler)(request)
    }
}
