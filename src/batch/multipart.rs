//! # Multipart Batch Parser
//!
//! ```text
//! --batch_1
//! Content-Type: application/http
//! Content-Transfer-Encoding: binary
//!
//! GET Customers('ALFKI') HTTP/1.1
//!
//! --batch_1
//! Content-Type: multipart/mixed; boundary=changeset_1
//!
//! --changeset_1
//! Content-Type: application/http
//! Content-ID: 1
//!
//! POST Customers HTTP/1.1
//! Content-Type: application/json
//!
//! {"CustomerID": "ALFKI"}
//! --changeset_1--
//! --batch_1--
//! ```
//!
//! Structural errors abort the whole batch before anything is dispatched.

use std::collections::HashSet;
use std::sync::OnceLock;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use regex::Regex;

use crate::errors::{ODataError, ODataResult};

use super::request::{BatchPart, BatchRequest, BatchSubRequest, ChangeSet, ContentId};

pub const CONTENT_ID: &str = "content-id";

const MULTIPART_MIXED: &str = "multipart/mixed";
const APPLICATION_HTTP: &str = "application/http";

/// Media type of a content type header value, lowercased, without parameters
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

static BOUNDARY_PARAM: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn boundary_pattern() -> ODataResult<&'static Regex> {
    BOUNDARY_PARAM
        .get_or_init(|| Regex::new(r#"(?i)(?:^|;)\s*boundary\s*=\s*(?:"([^"]+)"|([^;\s]+))"#))
        .as_ref()
        .map_err(|e| ODataError::internal(format!("Boundary pattern: {}", e)))
}

/// Boundary parameter of a `multipart/mixed` content type
pub fn boundary_of(content_type: &str) -> ODataResult<String> {
    let media = media_type(content_type);
    if media != MULTIPART_MIXED {
        return Err(ODataError::batch_malformed(format!(
            "Expected {} content type, found '{}'",
            MULTIPART_MIXED, media
        )));
    }

    let pattern = boundary_pattern()?;
    let params = content_type.split_once(';').map(|(_, p)| p).unwrap_or_default();

    pattern
        .captures(params)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ODataError::batch_malformed(format!(
                "Missing boundary parameter in '{}'",
                content_type
            ))
        })
}

/// Lines of each part between `--boundary` delimiters. Preamble and
/// epilogue are ignored.
pub fn split_parts<'b>(lines: &[&'b str], boundary: &str) -> ODataResult<Vec<Vec<&'b str>>> {
    let delimiter = format!("--{}", boundary);
    let closer = format!("--{}--", boundary);

    let mut parts = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    let mut seen_delimiter = false;

    for line in lines {
        let marker = line.trim_end();
        if marker == closer {
            parts.extend(current.take());
            return Ok(parts);
        }
        if marker == delimiter {
            seen_delimiter = true;
            parts.extend(current.take());
            current = Some(Vec::new());
            continue;
        }
        if let Some(part) = current.as_mut() {
            part.push(*line);
        }
    }

    Err(ODataError::batch_malformed(if seen_delimiter {
        format!("Missing closing delimiter '{}'", closer)
    } else {
        format!("No '{}' delimiter found", delimiter)
    }))
}

/// Header block up to the first blank line; returns the headers and the
/// index of the first line after the block
pub fn parse_headers(lines: &[&str]) -> ODataResult<(HeaderMap, usize)> {
    let mut headers = HeaderMap::new();

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            return Ok((headers, index + 1));
        }
        let malformed = || ODataError::batch_malformed(format!("Malformed header line '{}'", line));

        let (name, value) = line.split_once(':').ok_or_else(malformed)?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| malformed())?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| malformed())?;
        headers.append(name, value);
    }

    Ok((headers, lines.len()))
}

fn header_text<'h>(headers: &'h HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn body_text(lines: &[&str]) -> String {
    lines.join("\r\n").trim_end_matches(['\r', '\n']).to_string()
}

/// Parses one batch envelope into parts.
///
/// Sub-requests without a `Content-ID` are keyed -1, -2, ... in the order
/// they appear.
pub struct BatchParser {
    max_requests: usize,
    request_count: usize,
    next_synthetic: ContentId,
}

impl BatchParser {
    pub fn new(max_requests: usize) -> Self {
        Self {
            max_requests,
            request_count: 0,
            next_synthetic: -1,
        }
    }

    pub fn parse(mut self, content_type: &str, body: &str) -> ODataResult<BatchRequest> {
        let boundary = boundary_of(content_type)?;
        let lines: Vec<&str> = body.lines().collect();

        let parts = split_parts(&lines, &boundary)?
            .iter()
            .map(|part| self.parse_part(part))
            .collect::<ODataResult<Vec<_>>>()?;

        Ok(BatchRequest { boundary, parts })
    }

    fn parse_part(&mut self, lines: &[&str]) -> ODataResult<BatchPart> {
        let (part_headers, body_start) = parse_headers(lines)?;
        let content_type = header_text(&part_headers, CONTENT_TYPE).ok_or_else(|| {
            ODataError::batch_malformed("Batch part without Content-Type header")
        })?;

        match media_type(content_type).as_str() {
            MULTIPART_MIXED => {
                let boundary = boundary_of(content_type)?;
                let changeset = self.parse_changeset(boundary, &lines[body_start..])?;
                Ok(BatchPart::ChangeSet(changeset))
            }
            APPLICATION_HTTP => {
                let request = self.parse_request(&part_headers, &lines[body_start..])?;
                if request.method != Method::GET {
                    return Err(ODataError::batch_malformed(format!(
                        "{} {} outside a changeset; only GET is allowed there",
                        request.method, request.url
                    )));
                }
                Ok(BatchPart::Query(request))
            }
            other => Err(ODataError::batch_malformed(format!(
                "Unsupported batch part content type '{}'",
                other
            ))),
        }
    }

    fn parse_changeset(&mut self, boundary: String, lines: &[&str]) -> ODataResult<ChangeSet> {
        let mut requests = Vec::new();
        let mut content_ids = HashSet::new();

        for part in split_parts(lines, &boundary)? {
            let (part_headers, body_start) = parse_headers(&part)?;
            let media = header_text(&part_headers, CONTENT_TYPE)
                .map(media_type)
                .unwrap_or_default();
            if media != APPLICATION_HTTP {
                return Err(ODataError::batch_malformed(format!(
                    "Changeset part must be {}, found '{}'",
                    APPLICATION_HTTP, media
                )));
            }

            let request = self.parse_request(&part_headers, &part[body_start..])?;
            if request.has_explicit_content_id() && !content_ids.insert(request.content_id) {
                return Err(ODataError::batch_malformed(format!(
                    "Duplicate Content-ID {} in changeset '{}'",
                    request.content_id, boundary
                )));
            }
            requests.push(request);
        }

        Ok(ChangeSet { boundary, requests })
    }

    /// Embedded `VERB URL HTTP/1.1` request with its own header block
    fn parse_request(&mut self, part_headers: &HeaderMap, lines: &[&str]) -> ODataResult<BatchSubRequest> {
        self.request_count += 1;
        if self.request_count > self.max_requests {
            return Err(ODataError::batch_malformed(format!(
                "Batch has more than {} requests",
                self.max_requests
            )));
        }

        let request_line = lines
            .first()
            .ok_or_else(|| ODataError::batch_malformed("Batch part without a request line"))?;
        let mut words = request_line.split_whitespace();
        let (Some(verb), Some(url), Some(version), None) =
            (words.next(), words.next(), words.next(), words.next())
        else {
            return Err(ODataError::batch_malformed(format!(
                "Malformed request line '{}'",
                request_line
            )));
        };
        if !version.starts_with("HTTP/") {
            return Err(ODataError::batch_malformed(format!(
                "Malformed request line '{}'",
                request_line
            )));
        }
        let method = Method::from_bytes(verb.as_bytes())
            .map_err(|_| ODataError::batch_malformed(format!("Invalid method '{}'", verb)))?;

        let (headers, body_start) = parse_headers(&lines[1..])?;
        let content_id = self.content_id(part_headers, &headers)?;

        Ok(BatchSubRequest {
            content_id,
            method,
            url: url.to_string(),
            headers,
            body: body_text(&lines[1 + body_start..]),
        })
    }

    /// `Content-ID` from the part headers or the embedded request headers
    fn content_id(&mut self, part_headers: &HeaderMap, headers: &HeaderMap) -> ODataResult<ContentId> {
        let declared = header_text(part_headers, CONTENT_ID).or_else(|| header_text(headers, CONTENT_ID));
        match declared {
            Some(text) => match text.trim().parse::<ContentId>() {
                Ok(id) if id > 0 => Ok(id),
                _ => Err(ODataError::batch_malformed(format!(
                    "Invalid Content-ID '{}'; expected a positive integer",
                    text
                ))),
            },
            None => {
                let id = self.next_synthetic;
                self.next_synthetic -= 1;
                Ok(id)
            }
        }
    }
}

/// Parse a batch body under its declared content type
pub fn parse_batch(content_type: &str, body: &str, max_requests: usize) -> ODataResult<BatchRequest> {
    BatchParser::new(max_requests).parse(content_type, body)
}
