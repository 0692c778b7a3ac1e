//! odata-core - query option compiler, pagination engine and batch parser
//!
//! - `$filter` text is lexed, parsed against resource metadata into a
//!   typed expression tree, and either translated for a backend or
//!   evaluated directly over JSON entities
//! - `$orderby` becomes a sort tree and a composite comparator
//! - `$skiptoken` continues server-driven paging from the last sort key
//! - `multipart/mixed` batches are parsed, replayed in order and
//!   reassembled into one response

pub mod batch;
pub mod cli;
pub mod config;
pub mod errors;
pub mod filter;
pub mod metadata;
pub mod observability;
pub mod orderby;
pub mod query;
pub mod skiptoken;
pub mod translate;
