//! CLI command definitions for taskboard.
//!
//! The main entry point is the `Cli` struct which contains subcommands.
//! Running without a subcommand starts the HTTP server.

use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand};

/// Personal kanban board: HTTP API and command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format for command results (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Address for the HTTP server to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port for the HTTP server (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,

    /// Apply pending schema migrations and exit
    Migrate,

    /// Create a task at the end of its column
    Add(AddArgs),

    /// Show the active board
    List(PageArgs),

    /// Show archived tasks, most recent first
    Archived(PageArgs),

    /// Show one task
    Show { id: i64 },

    /// Change fields of a task
    Edit(EditArgs),

    /// Move a task to another column
    Move {
        id: i64,
        /// ToDo, Ongoing or Done
        status: String,
    },

    /// Set the order of tasks within a column
    Reorder {
        status: String,
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Archive a task; removes it for good if already archived
    Rm { id: i64 },

    /// Bring a task back to the end of To Do
    Restore { id: i64 },

    /// Permanently delete archived tasks
    Purge,

    /// List known tags
    Tags,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    #[arg(long, default_value = "ToDo")]
    pub status: String,

    #[arg(long)]
    pub urgent: bool,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub offset: i64,

    /// Page size (defaults to the configured listing limit)
    #[arg(long)]
    pub limit: Option<i64>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    /// New description; an empty string clears it
    #[arg(long)]
    pub description: Option<String>,

    /// New comma-separated tags; an empty string clears them
    #[arg(long)]
    pub tags: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,

    #[arg(long)]
    pub clear_due: bool,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub urgent: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["taskboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["taskboard", "list", "--format", "json", "-v"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Command::List(PageArgs { offset: 0, limit: None }))));
    }

    #[test]
    fn port_works_with_or_without_serve() {
        let cli = Cli::try_parse_from(["taskboard", "--port", "9000"]).unwrap();
        assert_eq!(cli.port, Some(9000));
        let cli = Cli::try_parse_from(["taskboard", "serve", "-p", "9001"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.port, Some(9001));
    }

    #[test]
    fn reorder_requires_ids() {
        assert!(Cli::try_parse_from(["taskboard", "reorder", "ToDo"]).is_err());
        let cli = Cli::try_parse_from(["taskboard", "reorder", "ToDo", "3", "1"]).unwrap();
        match cli.command {
            Some(Command::Reorder { status, ids }) => {
                assert_eq!(status, "ToDo");
                assert_eq!(ids, vec![3, 1]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn edit_due_conflicts_with_clear() {
        assert!(
            Cli::try_parse_from(["taskboard", "edit", "1", "--due", "2026-01-01", "--clear-due"])
                .is_err()
        );
    }
}
