//! CLI configuration.
//!
//! Loaded from `~/.config/icsync/config.toml` unless `--config` points
//! elsewhere. The `[sync]` table feeds straight into the engine's
//! `SyncConfig`; everything is a value, nothing is ambient.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use icsync_core::SyncConfig;
use serde::Deserialize;

fn default_document() -> String {
    "latest.ics".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the source document.
    pub source_dir: PathBuf,
    /// Document file name within `source_dir`.
    #[serde(default = "default_document")]
    pub document: String,
    /// Path of the JSON event store.
    pub store_path: PathBuf,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("could not determine config directory")?;
    Ok(config_dir.join("icsync").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_applies_defaults() {
        let config: Config = toml::from_str(
            r#"
            source_dir = "/data/calendar"
            store_path = "/data/store.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.document, "latest.ics");
        assert_eq!(config.sync.owner_tag_value, "icsync");
        assert!(!config.sync.dry_run);
        assert_eq!(config.sync.throttle.burst_every, 20);
    }

    #[test]
    fn sync_table_overrides() {
        let config: Config = toml::from_str(
            r#"
            source_dir = "/data/calendar"
            document = "work.ics"
            store_path = "/data/store.json"

            [sync]
            owner_tag_value = "icsync-work"
            dry_run = true

            [sync.timezone_aliases]
            "Romance Standard Time" = "Europe/Paris"

            [sync.throttle]
            mutation_pause_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.document, "work.ics");
        assert_eq!(config.sync.owner_tag_value, "icsync-work");
        assert!(config.sync.dry_run);
        assert_eq!(
            config.sync.timezone_aliases.get("Romance Standard Time").unwrap(),
            "Europe/Paris"
        );
        assert_eq!(config.sync.throttle.mutation_pause_ms, 250);
        // Unset throttle fields keep their defaults
        assert_eq!(config.sync.throttle.burst_every, 20);
    }
}
