//! Recurrence and visibility engine for virtual-world event listings.
//!
//! This crate provides the temporal core of an event-listing service:
//! - `event` types for raw stored rows and their normalized schedule
//! - `recurrence` for next-occurrence selection and live-status computation
//! - `query` for composable visibility filters over normalized events
//! - `presentation` for viewer-facing output with ownership redaction

pub mod clock;
pub mod error;
pub mod event;
pub mod presentation;
pub mod query;
pub mod recurrence;

// Re-export the main types at crate root for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{PlazaError, PlazaResult};
pub use event::{EventRecord, NormalizedEvent, RawTimestamp};
pub use presentation::{redact, to_public, PublicEvent, Viewer};
pub use query::{list_events, notification_window, EventListOptions, EventPredicate};
pub use recurrence::{cache_is_stale, normalize, normalize_all, select_next_start};
