//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in query and batch processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Query options
    /// `$filter` parsed and type-checked
    FilterParsed,
    /// `$orderby` parsed into a tree
    OrderByParsed,
    /// Skiptoken located in the sorted result
    SkipTokenResolved,
    /// Query rejected with a client error
    QueryRejected,
    /// A page of results returned
    PageServed,

    // Batch; BATCH_BEGIN, BATCH_COMPLETE and BATCH_ABORTED come from
    // the batch's ObservationScope
    /// One sub-request handed to the dispatcher
    BatchPartDispatched,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::FilterParsed => "FILTER_PARSED",
            Event::OrderByParsed => "ORDERBY_PARSED",
            Event::SkipTokenResolved => "SKIPTOKEN_RESOLVED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::PageServed => "PAGE_SERVED",

            Event::BatchPartDispatched => "BATCH_PART_DISPATCHED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::BatchPartDispatched | Event::SkipTokenResolved => Severity::Trace,
            Event::QueryRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
