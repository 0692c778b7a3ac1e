//! Sub-request dispatch capability

use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::errors::ODataError;

use super::request::BatchSubRequest;

/// Failure raised by the dispatch collaborator
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The collaborator could not process the request at all
    #[error("Dispatch of {method} {url} failed: {reason}")]
    Failed {
        method: String,
        url: String,
        reason: String,
    },

    #[error("Dispatcher unavailable: {0}")]
    Unavailable(String),
}

impl DispatchError {
    pub fn failed(request: &BatchSubRequest, reason: impl Into<String>) -> Self {
        DispatchError::Failed {
            method: request.method.to_string(),
            url: request.url.clone(),
            reason: reason.into(),
        }
    }
}

impl From<DispatchError> for ODataError {
    fn from(err: DispatchError) -> Self {
        ODataError::dispatch_failed(err.to_string())
    }
}

/// Captured response of one sub-request
#[derive(Debug, Clone)]
pub struct SubResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl SubResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Add a header; names and values that are not valid HTTP are skipped
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// Executes one sub-request against the service
pub trait SubRequestDispatcher {
    fn dispatch(&mut self, request: &BatchSubRequest) -> Result<SubResponse, DispatchError>;
}

impl<F> SubRequestDispatcher for F
where
    F: FnMut(&BatchSubRequest) -> Result<SubResponse, DispatchError>,
{
    fn dispatch(&mut self, request: &BatchSubRequest) -> Result<SubResponse, DispatchError> {
        self(request)
    }
}
