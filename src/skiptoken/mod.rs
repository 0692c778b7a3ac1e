//! # Skiptoken Paging
//!
//! Server-driven paging continues from the last entity of the previous
//! page. The continuation is a `$skiptoken` holding that entity's sort
//! key values; resuming locates the key in the freshly sorted result.

mod codec;
mod resolver;

pub use codec::{build_skiptoken, parse_skiptoken, segment_value, SkipToken};
pub use resolver::{build_key_object, resolve_next_page_start, SkipTokenResolver};
