//! Recurrence rule parsing and expansion.

pub mod expand;
pub mod rule;

pub use expand::expand_events;
pub use rule::{DaySpec, Frequency, RecurrenceRule};
