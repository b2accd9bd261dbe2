//! Per-run outcome summary.

use std::fmt;

/// Counts of what a run did (or, for dry runs, would have done).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub errors: usize,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn empty(dry_run: bool) -> Self {
        SyncReport {
            dry_run,
            ..SyncReport::default()
        }
    }

    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "[dry run] ")?;
        }
        write!(
            f,
            "Sync complete: {} created, {} updated, {} unchanged, {} deleted, {} errors",
            self.created, self.updated, self.unchanged, self.deleted, self.errors
        )
    }
}
