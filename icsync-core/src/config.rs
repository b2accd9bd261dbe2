//! Sync engine configuration.
//!
//! All tunables are explicit values handed to the engine per run; nothing
//! is ambient, so multiple scopes can run in one process (and tests can
//! zero the throttle pauses).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for one reconciliation scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Tag key marking events created by this system.
    pub owner_tag_key: String,
    /// Expected value of the ownership tag.
    pub owner_tag_value: String,
    /// Tag key holding the identity key on owned events.
    pub identity_tag_key: String,
    /// Compute and report the plan without mutating the store.
    pub dry_run: bool,
    /// Extra legacy-timezone-name aliases, layered over the built-ins.
    pub timezone_aliases: HashMap<String, String>,
    /// Duplicate identity keys tolerated before the run summary flags the
    /// document as suspect.
    pub duplicate_key_warn_threshold: usize,
    pub throttle: ThrottleConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            owner_tag_key: "managed-by".to_string(),
            owner_tag_value: "icsync".to_string(),
            identity_tag_key: "identity-key".to_string(),
            dry_run: false,
            timezone_aliases: HashMap::new(),
            duplicate_key_warn_threshold: 1,
            throttle: ThrottleConfig::default(),
        }
    }
}

/// Mutation throttling tunables, sized for burst-rate-limited stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Pause after every successful mutation.
    pub mutation_pause_ms: u64,
    /// Every Nth cumulative mutation triggers the longer burst pause.
    /// Zero disables the burst pause.
    pub burst_every: u64,
    pub burst_pause_ms: u64,
    /// Recovery pause after a failed store operation.
    pub error_pause_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        ThrottleConfig {
            mutation_pause_ms: 1000,
            burst_every: 20,
            burst_pause_ms: 5000,
            error_pause_ms: 10_000,
        }
    }
}

impl ThrottleConfig {
    /// All pauses disabled; for tests and dry runs.
    pub fn none() -> Self {
        ThrottleConfig {
            mutation_pause_ms: 0,
            burst_every: 0,
            burst_pause_ms: 0,
            error_pause_ms: 0,
        }
    }
}
