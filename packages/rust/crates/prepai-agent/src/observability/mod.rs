//! Structured event ids attached to `tracing` records.

mod session_events;

pub(crate) use session_events::SessionEvent;
