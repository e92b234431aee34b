//! taskboard: personal kanban board.
//!
//! Without a subcommand, serves the JSON API. Every other subcommand runs a
//! single lifecycle operation against the configured database and prints
//! the result.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use taskboard::api::{self, ApiServer};
use taskboard::cli::{AddArgs, Cli, Command, EditArgs, PageArgs};
use taskboard::config::{Config, ConfigLoader, ConfigPaths};
use taskboard::db::Database;
use taskboard::format::{
    OutputFormat, format_archived_markdown, format_board_markdown, format_tags_markdown,
    format_task_markdown,
};
use taskboard::logging::{self, LogTarget};
use taskboard::types::{NewTask, TaskPatch, TaskStatus, parse_due_date};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit --config replaces the project and user tiers.
    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_from(ConfigPaths::discover(), Some(Path::new(path)))?,
        None => ConfigLoader::load()?,
    };
    for (tier, source) in loader.sources() {
        debug!(%tier, path = %source.display(), "Config file");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(format) = cli.format {
        config.server.default_format = format;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Serve) | None => run_server(config).await?,
        Some(Command::Migrate) => run_migrate(&config)?,
        Some(command) => {
            let db = open_database(&config)?;
            run_command(&db, &config, command)?;
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?.with_archive_policy(config.archive.policy());
    Ok(db)
}

/// Run the HTTP server until Ctrl-C.
async fn run_server(config: Config) -> Result<()> {
    info!("Starting taskboard v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {:?}", config.server.db_path);
    info!(
        "Archive window: {}h, scan limit {}",
        config.archive.window_hours, config.archive.scan_limit
    );

    let db = Arc::new(open_database(&config)?);
    info!("Database initialized successfully");

    let state = ApiServer::new(db, config.listing.clone());
    api::serve(state, &config.server.host, config.server.port).await
}

fn run_migrate(config: &Config) -> Result<()> {
    config.ensure_db_dir()?;
    let (_db, applied) = Database::open_with_report(&config.server.db_path)?;
    if applied.is_empty() {
        println!("Schema is up to date: {}", config.server.db_path.display());
    } else {
        for name in applied {
            println!("Applied {}", name);
        }
    }
    Ok(())
}

fn print<T, F>(format: OutputFormat, value: &T, markdown: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Markdown => print!("{}", markdown(value)),
    }
    Ok(())
}

fn new_task(args: AddArgs) -> Result<NewTask> {
    let status = TaskStatus::from_input(&args.status)?;
    let mut task = NewTask::new(args.title, status).urgent(args.urgent);
    if let Some(description) = args.description {
        task = task.with_description(description);
    }
    if let Some(tags) = args.tags {
        task = task.with_tags(tags);
    }
    if let Some(due) = args.due {
        task = task.with_due_date(parse_due_date(&due)?);
    }
    Ok(task)
}

/// Empty strings on the command line clear the field.
fn cleared(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.trim().is_empty() { None } else { Some(v) })
}

fn task_patch(args: EditArgs) -> Result<TaskPatch> {
    let due_date = match (args.due, args.clear_due) {
        (Some(due), _) => Some(Some(parse_due_date(&due)?)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    Ok(TaskPatch {
        title: args.title,
        description: cleared(args.description),
        tags: cleared(args.tags),
        due_date,
        status: args.status.as_deref().map(TaskStatus::from_input).transpose()?,
        urgent: args.urgent,
    })
}

fn page(args: &PageArgs, default_limit: i64) -> (i64, i64) {
    (args.offset, args.limit.unwrap_or(default_limit))
}

fn run_command(db: &Database, config: &Config, command: Command) -> Result<()> {
    let format = config.server.default_format;
    let policy = *db.archive_policy();

    match command {
        Command::Add(args) => {
            let task = db.create_task(new_task(args)?)?;
            print(format, &policy.view(task), format_task_markdown)
        }
        Command::List(args) => {
            let (offset, limit) = page(&args, config.listing.active_limit);
            let views: Vec<_> = db
                .list_active(offset, limit)?
                .into_iter()
                .map(|t| policy.view(t))
                .collect();
            print(format, &views, |v| format_board_markdown(v))
        }
        Command::Archived(args) => {
            let (offset, limit) = page(&args, config.listing.archived_limit);
            let views: Vec<_> = db
                .list_archived(offset, limit)?
                .into_iter()
                .map(|t| policy.view(t))
                .collect();
            print(format, &views, |v| format_archived_markdown(v))
        }
        Command::Show { id } => print(format, &policy.view(db.get_task(id)?), format_task_markdown),
        Command::Edit(args) => {
            let id = args.id;
            let patch = task_patch(args)?;
            let task = if patch.is_empty() { db.get_task(id)? } else { db.update_task(id, patch)? };
            print(format, &policy.view(task), format_task_markdown)
        }
        Command::Move { id, status } => {
            let task = db.update_status(id, TaskStatus::from_input(&status)?)?;
            print(format, &policy.view(task), format_task_markdown)
        }
        Command::Reorder { status, ids } => {
            let status = TaskStatus::from_input(&status)?;
            let views: Vec<_> = db
                .reorder_tasks(status, &ids)?
                .into_iter()
                .map(|t| policy.view(t))
                .collect();
            print(format, &views, |v| format_board_markdown(v))
        }
        Command::Rm { id } => {
            let outcome = db.delete_task(id)?;
            let removed = outcome.is_removed();
            let view = policy.view(outcome.into_task());
            print(format, &view, |v| {
                let verb = if removed { "Deleted" } else { "Archived" };
                format!("{} task {}: {}\n", verb, v.task.id, v.task.title)
            })
        }
        Command::Restore { id } => {
            let task = db.restore_task(id)?;
            print(format, &policy.view(task), format_task_markdown)
        }
        Command::Purge => {
            let deleted_count = db.purge_archived()?;
            print(format, &api::PurgeResponse { deleted_count }, |r| {
                format!("Purged {} archived task(s)\n", r.deleted_count)
            })
        }
        Command::Tags => {
            let tags = db.list_tag_suggestions()?;
            print(format, &tags, |t| format_tags_markdown(t))
        }
        Command::Serve | Command::Migrate => Ok(()),
    }
}
