//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Explicit config file, bypassing tier discovery.
pub const CONFIG_PATH_ENV: &str = "TASKBOARD_CONFIG_PATH";

/// File tiers, lowest priority first. Built-in defaults sit below them and
/// environment overrides above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// `$CWD/taskboard/config.yaml`
    Project,
    /// `~/.taskboard/config.yaml`
    User,
    /// `--config` or `TASKBOARD_CONFIG_PATH`; replaces the other file tiers.
    Explicit,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Explicit => write!(f, "explicit"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: TASKBOARD_USER_DIR or ~/.taskboard
        let user_dir = std::env::var("TASKBOARD_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".taskboard")));

        // Project dir: TASKBOARD_PROJECT_DIR or $CWD/taskboard
        let project_dir = std::env::var("TASKBOARD_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskboard")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            ConfigTier::Explicit => None,
        }?;
        Some(dir.join("config.yaml"))
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    /// Config files that contributed, lowest tier first.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from(ConfigPaths::discover(), explicit.as_deref())
    }

    /// Load using `explicit` as the only file tier when given, otherwise
    /// merging the project and user tiers over the defaults.
    pub fn load_from(paths: ConfigPaths, explicit: Option<&Path>) -> Result<Self> {
        let mut configs: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        if let Some(path) = explicit {
            configs.push(read_yaml(path)?);
            sources.push((ConfigTier::Explicit, path.to_path_buf()));
        } else {
            // Tiers 2 and 3: project, then user
            for tier in [ConfigTier::Project, ConfigTier::User] {
                let Some(file) = paths.config_file(tier) else {
                    continue;
                };
                if !file.exists() {
                    continue;
                }
                match read_yaml(&file) {
                    Ok(value) => {
                        debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                        configs.push(value);
                        sources.push((tier, file));
                    }
                    Err(e) => warn!(tier = %tier, path = %file.display(), error = %e, "Ignoring unreadable config file"),
                }
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config =
            serde_json::from_value(merged).context("invalid configuration")?;

        // Tier 4: Environment variable overrides
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        Ok(Self { config, sources })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files merged into the result, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw, "Ignoring non-numeric environment override");
            None
        }
    }
}

/// Apply environment variable overrides to config.
fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = lookup("TASKBOARD_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(host) = lookup("TASKBOARD_HOST") {
        config.server.host = host;
    }

    if let Some(port) = lookup("TASKBOARD_PORT").and_then(|v| parse_number("TASKBOARD_PORT", &v)) {
        config.server.port = port;
    }

    if let Some(hours) = lookup("TASKBOARD_ARCHIVE_WINDOW_HOURS")
        .and_then(|v| parse_number("TASKBOARD_ARCHIVE_WINDOW_HOURS", &v))
    {
        config.archive.window_hours = hours;
    }
}
