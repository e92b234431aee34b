//! Configuration types and structures.

use crate::archive::{ArchivePolicy, DEFAULT_ARCHIVE_WINDOW_HOURS, DEFAULT_SCAN_LIMIT};
use crate::format::OutputFormat;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 8000;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub listing: ListingConfig,
}

impl Config {
    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default output format for CLI results (json or markdown).
    #[serde(default)]
    pub default_format: OutputFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            default_format: OutputFormat::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskboard/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// When completed and deleted tasks leave the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Hours a Done task stays on the board after completion.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,

    /// Upper bound on rows scanned by listings and removed per purge.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: i64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            scan_limit: default_scan_limit(),
        }
    }
}

impl ArchiveConfig {
    pub fn policy(&self) -> ArchivePolicy {
        ArchivePolicy::from_hours(self.window_hours).with_scan_limit(self.scan_limit)
    }
}

fn default_window_hours() -> i64 {
    DEFAULT_ARCHIVE_WINDOW_HOURS
}

fn default_scan_limit() -> i64 {
    DEFAULT_SCAN_LIMIT
}

/// Default page sizes for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_active_limit")]
    pub active_limit: i64,

    #[serde(default = "default_archived_limit")]
    pub archived_limit: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            active_limit: default_active_limit(),
            archived_limit: default_archived_limit(),
        }
    }
}

fn default_active_limit() -> i64 {
    100
}

fn default_archived_limit() -> i64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.db_path, PathBuf::from("taskboard/tasks.db"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.archive.window_hours, 8);
        assert_eq!(config.listing.active_limit, 100);
        assert_eq!(config.listing.archived_limit, 200);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("archive:\n  window_hours: 24\n").unwrap();
        assert_eq!(config.archive.window_hours, 24);
        assert_eq!(config.archive.scan_limit, DEFAULT_SCAN_LIMIT);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_archive_policy_from_config() {
        let archive = ArchiveConfig {
            window_hours: 2,
            scan_limit: 50,
        };
        let policy = archive.policy();
        assert_eq!(policy.window(), Duration::hours(2));
        assert_eq!(policy.scan_limit(), 50);
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.db_path = temp.path().join("nested/dir/tasks.db");

        config.ensure_db_dir().unwrap();
        assert!(temp.path().join("nested/dir").is_dir());
    }
}
