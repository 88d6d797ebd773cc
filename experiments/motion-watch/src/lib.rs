//! Helpers for the `motion-watch` orchestrator.

pub mod stats;
pub mod trigger;

pub use stats::{Stats, format_duration};
pub use trigger::Trigger;
