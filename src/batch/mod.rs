//! # Batch Requests
//!
//! `multipart/mixed` batches: parsing into sub-requests, sequential
//! dispatch with Content-ID references inside changesets, and the
//! composite response.

pub mod dispatcher;
pub mod multipart;
mod processor;
mod request;
mod response;

pub use dispatcher::{DispatchError, SubRequestDispatcher, SubResponse};
pub use multipart::{boundary_of, parse_batch, BatchParser};
pub use processor::{resolve_references, BatchProcessor};
pub use request::{BatchPart, BatchRequest, BatchSubRequest, ChangeSet, ContentId};
pub use response::{BatchResponse, BatchResponsePart, CapturedResponse};
