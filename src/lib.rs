//! Personal kanban task board.
//!
//! Tasks live in three ordered status columns. Finished and deleted tasks
//! move to an archive, from which they can be restored or purged. The
//! library exposes the lifecycle engine over SQLite; the binary adds a CLI
//! and an HTTP API on top.

pub mod api;
pub mod archive;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod logging;
pub mod tags;
pub mod types;
