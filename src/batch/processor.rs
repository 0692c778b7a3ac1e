//! # Batch Replay
//!
//! Sub-requests run one at a time in request order. Inside a changeset a
//! later request may name an earlier one's result as `$<Content-ID>`; the
//! placeholder is replaced with the Location captured from that response
//! before the later request is dispatched.

use std::collections::HashMap;
use std::sync::OnceLock;

use axum::http::Method;
use regex::Regex;

use crate::config::ServiceConfig;
use crate::errors::{ODataError, ODataResult};
use crate::observability::{log_event_with_fields, Event, ObservationScope};

use super::dispatcher::SubRequestDispatcher;
use super::multipart::parse_batch;
use super::request::{BatchPart, BatchRequest, BatchSubRequest, ChangeSet, ContentId};
use super::response::{BatchResponse, BatchResponsePart, CapturedResponse};

static PLACEHOLDER: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn placeholder_pattern() -> ODataResult<&'static Regex> {
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$(\d+)"))
        .as_ref()
        .map_err(|e| ODataError::internal(format!("Content-ID pattern: {}", e)))
}

/// `$<id>` standing as its own URL segment or JSON string, not a prefix of
/// other text such as `$5.00`
fn is_reference(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.map_or(true, |c| c.is_whitespace() || matches!(c, '"' | '/' | '(' | ','))
        && after.map_or(true, |c| {
            c.is_whitespace() || matches!(c, '"' | '/' | '?' | '(' | ')' | ',')
        })
}

/// Replace every `$<id>` reference in `text` with the location recorded for `id`
fn substitute(
    text: &str,
    pattern: &Regex,
    locations: &HashMap<ContentId, String>,
) -> ODataResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !is_reference(text, whole.start(), whole.end()) {
            continue;
        }
        let location = id
            .as_str()
            .parse::<ContentId>()
            .ok()
            .and_then(|id| locations.get(&id))
            .ok_or_else(|| ODataError::content_id_not_found(id.as_str()))?;

        out.push_str(&text[last..whole.start()]);
        out.push_str(location);
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

/// Copy of `request` with Content-ID references resolved
pub fn resolve_references(
    request: &BatchSubRequest,
    locations: &HashMap<ContentId, String>,
) -> ODataResult<BatchSubRequest> {
    let pattern = placeholder_pattern()?;

    let mut resolved = request.clone();
    resolved.url = substitute(&request.url, pattern, locations)?;
    resolved.body = substitute(&request.body, pattern, locations)?;
    Ok(resolved)
}

/// Runs parsed batches through a dispatcher
pub struct BatchProcessor<'a, D: SubRequestDispatcher> {
    dispatcher: &'a mut D,
    max_requests: usize,
}

impl<'a, D: SubRequestDispatcher> BatchProcessor<'a, D> {
    pub fn new(dispatcher: &'a mut D, config: &ServiceConfig) -> Self {
        Self {
            dispatcher,
            max_requests: config.max_batch_parts,
        }
    }

    /// Parse and execute a batch body
    pub fn process(&mut self, content_type: &str, body: &str) -> ODataResult<BatchResponse> {
        let request = parse_batch(content_type, body, self.max_requests).map_err(|err| {
            log_event_with_fields(
                Event::QueryRejected,
                &[("code", err.code().code()), ("reason", err.message())],
            );
            err
        })?;
        self.execute(&request)
    }

    /// Dispatch every sub-request of an already parsed batch
    pub fn execute(&mut self, request: &BatchRequest) -> ODataResult<BatchResponse> {
        let parts = request.parts.len().to_string();
        let requests = request.request_count().to_string();
        let scope = ObservationScope::with_fields(
            "BATCH",
            &[
                ("boundary", request.boundary.as_str()),
                ("parts", parts.as_str()),
                ("requests", requests.as_str()),
            ],
        );

        match self.run(request) {
            Ok(response) => {
                scope.complete();
                Ok(response)
            }
            Err(err) => {
                scope.fail(err.message());
                Err(err)
            }
        }
    }

    fn run(&mut self, request: &BatchRequest) -> ODataResult<BatchResponse> {
        let mut response = BatchResponse::new();
        for part in &request.parts {
            let part_response = match part {
                BatchPart::Query(query) => BatchResponsePart::Query(self.dispatch(query)?),
                BatchPart::ChangeSet(changeset) => BatchResponsePart::ChangeSet {
                    boundary: BatchResponse::changeset_boundary(),
                    responses: self.run_changeset(changeset)?,
                },
            };
            response.push(part_response);
        }
        Ok(response)
    }

    fn run_changeset(&mut self, changeset: &ChangeSet) -> ODataResult<Vec<CapturedResponse>> {
        let mut locations = HashMap::new();
        let mut responses = Vec::with_capacity(changeset.requests.len());

        for request in &changeset.requests {
            let resolved = resolve_references(request, &locations)?;
            let captured = self.dispatch(&resolved)?;

            if captured.response.status.is_success() {
                match captured.response.location() {
                    Some(location) => {
                        locations.insert(resolved.content_id, location.to_string());
                    }
                    None if resolved.method == Method::POST => {
                        return Err(ODataError::missing_location(
                            resolved.method.as_str(),
                            &resolved.url,
                        ));
                    }
                    None => {}
                }
            }
            responses.push(captured);
        }

        Ok(responses)
    }

    fn dispatch(&mut self, request: &BatchSubRequest) -> ODataResult<CapturedResponse> {
        let response = self.dispatcher.dispatch(request)?;

        let content_id = request.content_id.to_string();
        let status = response.status.as_u16().to_string();
        log_event_with_fields(
            Event::BatchPartDispatched,
            &[
                ("content_id", content_id.as_str()),
                ("method", request.method.as_str()),
                ("status", status.as_str()),
                ("url", request.url.as_str()),
            ],
        );

        Ok(CapturedResponse {
            content_id: request.content_id,
            response,
        })
    }
}
