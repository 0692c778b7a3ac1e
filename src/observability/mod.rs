//! Observability
//!
//! Structured JSON logging of query and batch lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No async or background threads
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use odata_core::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::PageServed, &[("count", "42")]);
//!
//! let scope = ObservationScope::new("BATCH");
//! // ... dispatch parts ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
