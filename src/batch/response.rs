//! Composite batch response
//!
//! Mirrors the request envelope: one `application/http` part per query,
//! one nested `multipart/mixed` body per changeset.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::dispatcher::SubResponse;
use super::request::ContentId;

/// Response of one sub-request, with the key of the request it answers
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub content_id: ContentId,
    pub response: SubResponse,
}

#[derive(Debug, Clone)]
pub enum BatchResponsePart {
    Query(CapturedResponse),
    ChangeSet {
        boundary: String,
        responses: Vec<CapturedResponse>,
    },
}

/// Responses in request order under fresh boundaries
#[derive(Debug, Clone)]
pub struct BatchResponse {
    boundary: String,
    parts: Vec<BatchResponsePart>,
}

impl Default for BatchResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchResponse {
    pub fn new() -> Self {
        Self {
            boundary: format!("batchresponse_{}", Uuid::new_v4()),
            parts: Vec::new(),
        }
    }

    /// Fresh boundary for a changeset response
    pub fn changeset_boundary() -> String {
        format!("changesetresponse_{}", Uuid::new_v4())
    }

    pub fn push(&mut self, part: BatchResponsePart) {
        self.parts.push(part);
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[BatchResponsePart] {
        &self.parts
    }

    /// Captured responses in dispatch order
    pub fn responses(&self) -> impl Iterator<Item = &CapturedResponse> {
        self.parts.iter().flat_map(|part| match part {
            BatchResponsePart::Query(captured) => std::slice::from_ref(captured).iter(),
            BatchResponsePart::ChangeSet { responses, .. } => responses.iter(),
        })
    }

    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Serialized multipart body
    pub fn to_body(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            out.push_str(&format!("--{}\r\n", self.boundary));
            match part {
                BatchResponsePart::Query(captured) => write_http_part(&mut out, captured),
                BatchResponsePart::ChangeSet {
                    boundary,
                    responses,
                } => {
                    out.push_str(&format!(
                        "Content-Type: multipart/mixed; boundary={}\r\n\r\n",
                        boundary
                    ));
                    for captured in responses {
                        out.push_str(&format!("--{}\r\n", boundary));
                        write_http_part(&mut out, captured);
                    }
                    out.push_str(&format!("--{}--\r\n", boundary));
                }
            }
        }
        out.push_str(&format!("--{}--\r\n", self.boundary));
        out
    }
}

fn write_http_part(out: &mut String, captured: &CapturedResponse) {
    out.push_str("Content-Type: application/http\r\n");
    out.push_str("Content-Transfer-Encoding: binary\r\n");
    if captured.content_id > 0 {
        out.push_str(&format!("Content-ID: {}\r\n", captured.content_id));
    }
    out.push_str("\r\n");

    let status = captured.response.status;
    out.push_str(&format!(
        "HTTP/1.1 {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    ));
    write_headers(out, &captured.response.headers);
    out.push_str("\r\n");
    if !captured.response.body.is_empty() {
        out.push_str(&captured.response.body);
        out.push_str("\r\n");
    }
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        out.push_str(&format!(
            "{}: {}\r\n",
            canonical_header_name(name.as_str()),
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
}

/// `content-type` → `Content-Type`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn captured(content_id: ContentId, status: StatusCode) -> CapturedResponse {
        CapturedResponse {
            content_id,
            response: SubResponse::new(status),
        }
    }

    #[test]
    fn test_boundaries_are_fresh() {
        let a = BatchResponse::new();
        let b = BatchResponse::new();
        assert!(a.boundary().starts_with("batchresponse_"));
        assert_ne!(a.boundary(), b.boundary());
        assert!(BatchResponse::changeset_boundary().starts_with("changesetresponse_"));
    }

    #[test]
    fn test_body_layout() {
        let mut response = BatchResponse::new();
        response.push(BatchResponsePart::Query(CapturedResponse {
            content_id: -1,
            response: SubResponse::new(StatusCode::OK)
                .with_header("Content-Type", "application/json")
                .with_body("{\"d\": []}"),
        }));
        response.push(BatchResponsePart::ChangeSet {
            boundary: "changesetresponse_x".into(),
            responses: vec![
                captured(1, StatusCode::CREATED),
                captured(-2, StatusCode::NO_CONTENT),
            ],
        });

        let b = response.boundary().to_string();
        let expected = [
            format!("--{}", b),
            "Content-Type: application/http".into(),
            "Content-Transfer-Encoding: binary".into(),
            "".into(),
            "HTTP/1.1 200 OK".into(),
            "Content-Type: application/json".into(),
            "".into(),
            "{\"d\": []}".into(),
            format!("--{}", b),
            "Content-Type: multipart/mixed; boundary=changesetresponse_x".into(),
            "".into(),
            "--changesetresponse_x".into(),
            "Content-Type: application/http".into(),
            "Content-Transfer-Encoding: binary".into(),
            "Content-ID: 1".into(),
            "".into(),
            "HTTP/1.1 201 Created".into(),
            "".into(),
            "--changesetresponse_x".into(),
            "Content-Type: application/http".into(),
            "Content-Transfer-Encoding: binary".into(),
            "".into(),
            "HTTP/1.1 204 No Content".into(),
            "".into(),
            "--changesetresponse_x--".into(),
            format!("--{}--", b),
            "".into(),
        ]
        .join("\r\n");
        assert_eq!(response.to_body(), expected);
        assert_eq!(response.responses().count(), 3);
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("etag"), "Etag");
        assert_eq!(canonical_header_name("x-custom-id"), "X-Custom-Id");
    }
}
