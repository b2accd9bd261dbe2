//! Core engine for icsync.
//!
//! This crate turns an RFC 5545-style ICS document into a flat set of
//! concrete, uniquely-keyed events and reconciles them against a mutable
//! target event store:
//! - `ics` parses raw document text into [`EventRecord`]s
//! - `recurrence` expands recurring masters into individual occurrences
//! - `sync` diffs the expanded events against the store and applies the
//!   minimal create/update/delete plan
//!
//! The store and the document source are abstract collaborators (see
//! [`store::EventStore`] and [`source::DocumentSource`]); icsync-cli
//! provides concrete implementations.

pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod recurrence;
pub mod source;
pub mod store;
pub mod sync;
pub mod timezone;

pub use config::{SyncConfig, ThrottleConfig};
pub use error::{SyncError, SyncResult};
pub use event::EventRecord;
