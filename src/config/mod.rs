//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/taskboard/config.yaml`
//! 3. **User** - `~/.taskboard/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `TASKBOARD_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `TASKBOARD_DB_PATH` - Database path
//! - `TASKBOARD_HOST` / `TASKBOARD_PORT` - HTTP bind address
//! - `TASKBOARD_ARCHIVE_WINDOW_HOURS` - Hours a Done task stays on the board
//! - `TASKBOARD_USER_DIR` - User config dir (default: `~/.taskboard`)
//! - `TASKBOARD_PROJECT_DIR` - Project config dir (default: `./taskboard`)

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_PATH_ENV, ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::deep_merge;
pub use types::*;
