//! Transport seam: one HTTP exchange with the store backend.
//!
//! `SessionManager` drives every authenticated call through a [`Transport`].
//! [`http::HttpTransport`] is the production implementation and
//! [`mock::MockTransport`] is a scripted double for tests.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use reqwest::{Method, StatusCode};

/// Transport-level failures unrelated to authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend error: {0}")]
    Backend(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl TransportError {
    /// Generic message for end users; callers may offer a manual retry.
    pub fn user_message(&self) -> &'static str {
        "We couldn't reach the store service. Please try again."
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Single-file multipart upload.
    File { field: String, file_name: String, bytes: Vec<u8> },
}

/// Outbound call description. Cloned, never mutated, when credentials change.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub id: Uuid,
    pub method: Method,
    /// Path relative to the configured base URL, starting with `/`.
    pub path: String,
    pub body: RequestBody,
    bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: RequestBody) -> Self {
        Self { id: Uuid::new_v4(), method, path: path.into(), body, bearer: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, RequestBody::Empty)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path, RequestBody::Empty)
    }

    pub fn post_json<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, TransportError> {
        Self::with_json(Method::POST, path, body)
    }

    pub fn put_json<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, TransportError> {
        Self::with_json(Method::PUT, path, body)
    }

    pub fn patch_json<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, TransportError> {
        Self::with_json(Method::PATCH, path, body)
    }

    pub fn upload(path: impl Into<String>, field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        let body = RequestBody::File { field: field.to_string(), file_name: file_name.to_string(), bytes };
        Self::new(Method::POST, path, body)
    }

    fn with_json<B: Serialize>(method: Method, path: impl Into<String>, body: &B) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        Ok(Self::new(method, path, RequestBody::Json(value)))
    }

    /// Copy of this request carrying `token` as its bearer credential.
    pub fn with_bearer(&self, token: impl Into<String>) -> Self {
        Self { bearer: Some(token.into()), ..self.clone() }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Vec::new())
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string().into_bytes())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Turn a non-2xx response into [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(TransportError::Status { status: self.status.as_u16(), message: self.error_message() })
    }

    /// Best-effort human message: `detail` or `error` from a JSON body, else the raw text.
    pub fn error_message(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            for key in ["detail", "error", "message"] {
                if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                    return msg.to_string();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.body);
        let text = text.trim();
        if text.is_empty() {
            self.status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            text.chars().take(200).collect()
        }
    }
}

/// A single request/response exchange. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
