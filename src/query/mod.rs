//! # Query Options
//!
//! System query option parsing and the page pipeline that applies
//! `$filter`, `$orderby`, `$skiptoken`, `$skip` and `$top` to an entity set.

pub mod encoding;
mod options;
mod processor;

pub use options::{next_link, QueryOptions};
pub use processor::{QueryPage, QueryProcessor};
