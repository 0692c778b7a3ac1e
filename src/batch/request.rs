//! Parsed batch request model

use axum::http::{HeaderMap, Method};

/// Request key within a batch.
///
/// Positive values come from a part's `Content-ID` header; parts without
/// one get strictly decreasing negative keys in encounter order.
pub type ContentId = i64;

/// One embedded HTTP request
#[derive(Debug, Clone)]
pub struct BatchSubRequest {
    pub content_id: ContentId,
    pub method: Method,
    pub url: String,
    /// Embedded request headers, names lowercased
    pub headers: HeaderMap,
    pub body: String,
}

impl BatchSubRequest {
    /// Whether the key came from an explicit `Content-ID`
    pub fn has_explicit_content_id(&self) -> bool {
        self.content_id > 0
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Atomic group of modifying requests under a nested boundary
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub boundary: String,
    pub requests: Vec<BatchSubRequest>,
}

/// Top-level part of a batch, in request order
#[derive(Debug, Clone)]
pub enum BatchPart {
    /// Standalone GET
    Query(BatchSubRequest),
    ChangeSet(ChangeSet),
}

impl BatchPart {
    /// Number of sub-requests the part dispatches
    pub fn request_count(&self) -> usize {
        match self {
            BatchPart::Query(_) => 1,
            BatchPart::ChangeSet(changeset) => changeset.requests.len(),
        }
    }
}

/// Whole batch envelope
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub boundary: String,
    pub parts: Vec<BatchPart>,
}

impl BatchRequest {
    pub fn request_count(&self) -> usize {
        self.parts.iter().map(BatchPart::request_count).sum()
    }
}
