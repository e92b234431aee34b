//! Output formatting for the CLI: JSON or markdown.

use crate::archive::TaskView;
use crate::types::{DUE_DATE_FORMAT, TaskStatus};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    #[value(alias = "md")]
    #[serde(alias = "md")]
    Markdown,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Format a single task as markdown.
pub fn format_task_markdown(view: &TaskView) -> String {
    let task = &view.task;
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: {}\n", task.id));
    md.push_str(&format!("- **status**: {}\n", task.status.label()));
    md.push_str(&format!("- **position**: {}\n", task.order_index));

    if task.urgent {
        md.push_str("- **urgent**: yes\n");
    }
    if !task.tags.is_empty() {
        md.push_str(&format!("- **tags**: {}\n", task.tags.join(", ")));
    }
    if let Some(due) = task.due_date {
        md.push_str(&format!("- **due**: {}\n", due.format(DUE_DATE_FORMAT)));
    }
    md.push_str(&format!("- **created**: {}\n", timestamp(task.created_at)));
    if let Some(done_at) = task.done_at {
        md.push_str(&format!("- **done**: {}\n", timestamp(done_at)));
    }
    if let Some(deleted_at) = task.deleted_at {
        md.push_str(&format!("- **deleted**: {}\n", timestamp(deleted_at)));
    }
    if let Some(archives_at) = view.archives_at {
        md.push_str(&format!("- **archives**: {}\n", timestamp(archives_at)));
    }

    if let Some(ref desc) = task.description {
        md.push_str("\n### Description\n");
        md.push_str(desc);
        md.push('\n');
    }

    md
}

/// One line per task for lists.
fn format_task_short(view: &TaskView) -> String {
    let task = &view.task;
    let urgent = if task.urgent { "!!! " } else { "" };
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", task.tags.join(", "))
    };
    let due = task
        .due_date
        .map(|d| format!(" (due {})", d.format(DUE_DATE_FORMAT)))
        .unwrap_or_default();

    format!("- {}{} `#{}`{}{}\n", urgent, task.title, task.id, tags, due)
}

/// The board as markdown, one section per column in board order.
/// Empty columns are omitted.
pub fn format_board_markdown(views: &[TaskView]) -> String {
    let mut md = format!("# Board ({})\n\n", views.len());

    for status in TaskStatus::ALL {
        let column: Vec<&TaskView> = views.iter().filter(|v| v.task.status == status).collect();
        if column.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", status.label()));
        for view in column {
            md.push_str(&format_task_short(view));
        }
        md.push('\n');
    }

    md
}

/// Archived tasks as markdown, in the order given.
pub fn format_archived_markdown(views: &[TaskView]) -> String {
    let mut md = format!("# Archived ({})\n\n", views.len());
    for view in views {
        let task = &view.task;
        let when = task.deleted_at.or(task.done_at).map(timestamp).unwrap_or_default();
        let reason = if task.deleted_at.is_some() { "deleted" } else { "done" };
        md.push_str(&format!(
            "- {} `#{}` ({} {})\n",
            task.title, task.id, reason, when
        ));
    }
    md
}

pub fn format_tags_markdown(tags: &[String]) -> String {
    let mut md = format!("# Tags ({})\n\n", tags.len());
    for tag in tags {
        md.push_str(&format!("- {}\n", tag));
    }
    md
}
