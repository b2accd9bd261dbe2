//! Reconciliation: diff computation and plan application.

pub mod engine;
pub mod plan;
pub mod report;

pub use engine::{apply_plan, sync_events};
pub use plan::{ChangeKind, EventChange, SyncPlan, event_window};
pub use report::SyncReport;
