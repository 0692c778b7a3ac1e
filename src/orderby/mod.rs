//! # `$orderby` Support
//!
//! Builds an `OrderByTree` from clause text and synthesizes comparators
//! from it. The same comparator drives sorting, skiptoken resumption and
//! next-token construction.

mod comparator;
mod tree;

pub use comparator::{segment_comparator, OrderByComparator, SegmentComparator};
pub use tree::{parse_orderby, OrderByPathSegment, OrderByTree, SortDirection, SubPathSegment};
