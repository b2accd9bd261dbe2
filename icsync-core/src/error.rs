//! Error types for icsync.

use thiserror::Error;

/// Errors that can occur during a sync run.
///
/// Only `SourceUnavailable` and `StoreUnavailable` abort a run, and both
/// are raised before any mutation is attempted. Per-record parse problems
/// and per-mutation store failures are contained where they occur.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Source document not available: {0}")]
    SourceUnavailable(String),

    #[error("Event store not available: {0}")]
    StoreUnavailable(String),

    #[error("Event store operation failed: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for icsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
