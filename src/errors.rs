//! Error types for query processing and batch handling
//!
//! Error codes:
//! - ODATA_SYNTAX_ERROR (REJECT)
//! - ODATA_TYPE_MISMATCH (REJECT)
//! - ODATA_UNKNOWN_FUNCTION (REJECT)
//! - ODATA_UNKNOWN_PROPERTY (REJECT)
//! - ODATA_COLLECTION_NOT_ALLOWED (REJECT)
//! - ODATA_INVALID_ORDERBY (REJECT)
//! - ODATA_SKIPTOKEN_MISMATCH (REJECT)
//! - ODATA_INVALID_QUERY_OPTION (REJECT)
//! - ODATA_BATCH_MALFORMED (REJECT)
//! - ODATA_BATCH_CONTENT_ID_NOT_FOUND (REJECT)
//! - ODATA_BATCH_MISSING_LOCATION (REJECT)
//! - ODATA_DISPATCH_FAILED (ERROR)
//! - ODATA_PROVIDER_CONFIGURATION (FATAL)
//! - ODATA_INTERNAL (FATAL)

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// A collaborator failed while serving the request
    Error,
    /// Inconsistency between metadata, data and server configuration
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes surfaced by the query core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ODataErrorCode {
    /// Bad token, unterminated literal, unexpected end of input
    Syntax,
    /// Operator or function applied to operands of the wrong type
    TypeMismatch,
    /// No function signature matches the call
    UnknownFunction,
    /// Property name does not resolve against the resource type
    UnknownProperty,
    /// Navigation through a collection-valued property
    CollectionNotAllowed,
    /// Unsortable or malformed $orderby clause
    InvalidOrderBy,
    /// $skiptoken does not fit the $orderby clause
    SkipTokenMismatch,
    /// Malformed or unknown system query option
    InvalidQueryOption,
    /// Structurally broken batch body
    BatchMalformed,
    /// `$<id>` placeholder without a matching earlier Content-ID
    BatchContentIdNotFound,
    /// Successful POST inside a batch returned no Location header
    BatchMissingLocation,
    /// Sub-request dispatch collaborator failed
    DispatchFailed,
    /// Translator cannot produce unambiguous output
    ProviderConfiguration,
    /// Property read/write failure on an instance
    Internal,
}

impl ODataErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ODataErrorCode::Syntax => "ODATA_SYNTAX_ERROR",
            ODataErrorCode::TypeMismatch => "ODATA_TYPE_MISMATCH",
            ODataErrorCode::UnknownFunction => "ODATA_UNKNOWN_FUNCTION",
            ODataErrorCode::UnknownProperty => "ODATA_UNKNOWN_PROPERTY",
            ODataErrorCode::CollectionNotAllowed => "ODATA_COLLECTION_NOT_ALLOWED",
            ODataErrorCode::InvalidOrderBy => "ODATA_INVALID_ORDERBY",
            ODataErrorCode::SkipTokenMismatch => "ODATA_SKIPTOKEN_MISMATCH",
            ODataErrorCode::InvalidQueryOption => "ODATA_INVALID_QUERY_OPTION",
            ODataErrorCode::BatchMalformed => "ODATA_BATCH_MALFORMED",
            ODataErrorCode::BatchContentIdNotFound => "ODATA_BATCH_CONTENT_ID_NOT_FOUND",
            ODataErrorCode::BatchMissingLocation => "ODATA_BATCH_MISSING_LOCATION",
            ODataErrorCode::DispatchFailed => "ODATA_DISPATCH_FAILED",
            ODataErrorCode::ProviderConfiguration => "ODATA_PROVIDER_CONFIGURATION",
            ODataErrorCode::Internal => "ODATA_INTERNAL",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ODataErrorCode::DispatchFailed => Severity::Error,
            ODataErrorCode::ProviderConfiguration | ODataErrorCode::Internal => Severity::Fatal,
            _ => Severity::Reject,
        }
    }

    /// HTTP status the error surfaces as
    pub fn status_code(&self) -> StatusCode {
        match self.severity() {
            Severity::Reject => StatusCode::BAD_REQUEST,
            Severity::Error => StatusCode::BAD_GATEWAY,
            Severity::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ODataErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query core error with full context
#[derive(Debug, Clone, PartialEq)]
pub struct ODataError {
    /// Error code
    code: ODataErrorCode,
    /// Human-readable message
    message: String,
    /// Offset into the query option text, if applicable
    position: Option<usize>,
}

impl ODataError {
    /// Create an error with an explicit code
    pub fn new(code: ODataErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            position: None,
        }
    }

    /// Create a syntax error at the given input position
    pub fn syntax(position: usize, reason: impl Into<String>) -> Self {
        Self {
            code: ODataErrorCode::Syntax,
            message: format!("{} at position {}", reason.into(), position),
            position: Some(position),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::TypeMismatch, reason)
    }

    /// Create an unknown function error naming the supplied argument types
    pub fn unknown_function(name: &str, arg_types: &[String]) -> Self {
        Self::new(
            ODataErrorCode::UnknownFunction,
            format!(
                "No function '{}' found for arguments ({})",
                name,
                arg_types.join(", ")
            ),
        )
    }

    /// Create an unknown property error
    pub fn unknown_property(type_name: &str, property: &str) -> Self {
        Self::new(
            ODataErrorCode::UnknownProperty,
            format!("Property '{}' not found on type '{}'", property, type_name),
        )
    }

    /// Create an entity-collection-in-path error
    pub fn collection_not_allowed(property: &str) -> Self {
        Self::new(
            ODataErrorCode::CollectionNotAllowed,
            format!(
                "Entity collection not allowed in filter or orderby: '{}'",
                property
            ),
        )
    }

    /// Create an invalid orderby error
    pub fn invalid_orderby(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::InvalidOrderBy, reason)
    }

    /// Create a skiptoken mismatch error
    pub fn skiptoken_mismatch(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::SkipTokenMismatch, reason)
    }

    /// Create an invalid query option error
    pub fn invalid_query_option(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::InvalidQueryOption, reason)
    }

    /// Create a malformed batch error
    pub fn batch_malformed(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::BatchMalformed, reason)
    }

    /// Create an unresolved Content-ID error
    pub fn content_id_not_found(content_id: &str) -> Self {
        Self::new(
            ODataErrorCode::BatchContentIdNotFound,
            format!("Content-ID '{}' not found in changeset", content_id),
        )
    }

    /// Create a missing Location error
    pub fn missing_location(verb: &str, url: &str) -> Self {
        Self::new(
            ODataErrorCode::BatchMissingLocation,
            format!("Response to {} {} carries no Location header", verb, url),
        )
    }

    /// Create a dispatch failure error
    pub fn dispatch_failed(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::DispatchFailed, reason)
    }

    /// Create a provider configuration error
    pub fn provider_configuration(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::ProviderConfiguration, reason)
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(ODataErrorCode::Internal, reason)
    }

    /// Returns the error code
    pub fn code(&self) -> ODataErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the input position if applicable
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Returns true for client-caused errors
    pub fn is_client_error(&self) -> bool {
        self.severity() == Severity::Reject
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl fmt::Display for ODataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ODataError {}

/// Result type for query core operations
pub type ODataResult<T> = Result<T, ODataError>;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl From<&ODataError> for ErrorResponse {
    fn from(err: &ODataError) -> Self {
        Self {
            error: err.message.clone(),
            code: err.code.code(),
            status: err.status_code().as_u16(),
            position: err.position,
        }
    }
}

impl IntoResponse for ODataError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}
