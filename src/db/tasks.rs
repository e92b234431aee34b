//! Task lifecycle operations: create, update, move, reorder, delete, restore
//! and purge.

use super::ordering::next_order_index;
use super::tag_store::ensure_raw_tags;
use super::{Database, from_millis, now_utc};
use crate::archive::{ACTIVE_PREDICATE, ARCHIVED_PREDICATE};
use crate::error::{TaskError, TaskResult};
use crate::lifecycle::{self, DeleteAction, RESTORE_STATUS};
use crate::tags::{normalize_tags, parse_tags};
use crate::types::{DUE_DATE_FORMAT, DeleteOutcome, NewTask, Task, TaskPatch, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, named_params, params};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const TASK_COLUMNS: &str =
    "id, title, description, tags, due_date, status, created_at, order_index, done_at, deleted_at, urgent";

/// Board order: columns left to right, then position within the column.
const ACTIVE_ORDER: &str =
    "CASE status WHEN 'ToDo' THEN 0 WHEN 'Ongoing' THEN 1 ELSE 2 END, order_index, id";

/// Most recently archived first.
const ARCHIVED_ORDER: &str = "COALESCE(deleted_at, done_at) DESC, id DESC";

fn millis_to_datetime(column: &str, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    from_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Integer,
            format!("{} out of range: {}", column, ms).into(),
        )
    })
}

fn optional_datetime(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(column)?
        .map(|ms| millis_to_datetime(column, ms))
        .transpose()
}

fn parse_stored_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DUE_DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let tags: Option<String> = row.get("tags")?;
    let due_date: Option<String> = row.get("due_date")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        tags: parse_tags(tags.as_deref()),
        due_date: due_date.as_deref().map(parse_stored_date).transpose()?,
        status: row.get("status")?,
        created_at: millis_to_datetime("created_at", created_at)?,
        order_index: row.get::<_, Option<i64>>("order_index")?.unwrap_or(0),
        done_at: optional_datetime(row, "done_at")?,
        deleted_at: optional_datetime(row, "deleted_at")?,
        urgent: row.get::<_, Option<bool>>("urgent")?.unwrap_or(false),
    })
}

/// Rows that fail to decode are reported as corrupt rather than as a
/// database failure.
fn decode_error(err: rusqlite::Error) -> TaskError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(_, _, cause) => TaskError::Corrupt(cause.to_string()),
        rusqlite::Error::InvalidColumnType(_, column, kind) => {
            TaskError::Corrupt(format!("unexpected {} in column {}", kind, column))
        }
        other => TaskError::Database(other),
    }
}

/// Load a task using an existing connection or transaction.
fn get_task_internal(conn: &Connection, task_id: i64) -> TaskResult<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    conn.query_row(&sql, params![task_id], parse_task_row)
        .optional()
        .map_err(decode_error)
}

fn require_task(conn: &Connection, task_id: i64) -> TaskResult<Task> {
    get_task_internal(conn, task_id)?.ok_or(TaskError::NotFound(task_id))
}

fn validate_title(title: &str) -> TaskResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::missing_field("title"));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as NULL.
fn clean_text(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn due_date_to_sql(due: Option<NaiveDate>) -> Option<String> {
    due.map(|d| d.format(DUE_DATE_FORMAT).to_string())
}

fn millis(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|t| t.timestamp_millis())
}

/// Move `task` to `next`, allocating a slot in the new column when it changes
/// and keeping `done_at` consistent with the status.
fn apply_status(
    conn: &Connection,
    task: &Task,
    next: TaskStatus,
    now: DateTime<Utc>,
) -> TaskResult<i64> {
    let change = lifecycle::plan_status_change(task, next, now);
    let order_index = if change.needs_slot {
        next_order_index(conn, change.status)?
    } else {
        task.order_index
    };

    conn.execute(
        "UPDATE tasks SET status = ?1, order_index = ?2, done_at = ?3 WHERE id = ?4",
        params![change.status, order_index, millis(change.done_at), task.id],
    )?;

    if change.needs_slot {
        debug!(
            task_id = task.id,
            from = %task.status,
            to = %change.status,
            order_index,
            "Task moved to new column"
        );
    }
    Ok(order_index)
}

impl Database {
    /// Create a task at the end of its status column.
    pub fn create_task(&self, input: NewTask) -> TaskResult<Task> {
        let title = validate_title(&input.title)?;
        let tags = normalize_tags(input.tags.as_deref());
        let description = clean_text(input.description);
        let now = now_utc();
        let done_at = (input.status == TaskStatus::Done).then_some(now);

        self.with_tx(|tx| {
            let order_index = next_order_index(tx, input.status)?;

            tx.execute(
                "INSERT INTO tasks (
                    title, description, tags, due_date, status,
                    created_at, order_index, done_at, deleted_at, urgent
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
                params![
                    &title,
                    &description,
                    &tags,
                    due_date_to_sql(input.due_date),
                    input.status,
                    now.timestamp_millis(),
                    order_index,
                    millis(done_at),
                    input.urgent,
                ],
            )?;
            let task_id = tx.last_insert_rowid();

            ensure_raw_tags(tx, tags.as_deref())?;

            debug!(task_id, status = %input.status, order_index, "Task created");
            require_task(tx, task_id)
        })
    }

    /// Get a task by id, including soft-deleted ones.
    pub fn get_task(&self, task_id: i64) -> TaskResult<Task> {
        self.with_conn(|conn| require_task(conn, task_id))
    }

    /// Move a task to another status column.
    ///
    /// Unchanged status is a no-op apart from backfilling a missing
    /// completion timestamp on Done tasks.
    pub fn update_status(&self, task_id: i64, status: TaskStatus) -> TaskResult<Task> {
        let now = now_utc();
        self.with_tx(|tx| {
            let task = require_task(tx, task_id)?;
            apply_status(tx, &task, status, now)?;
            require_task(tx, task_id)
        })
    }

    /// Apply the fields present in `patch`, leaving the rest untouched.
    /// A status change follows the same rule as [`Database::update_status`].
    pub fn update_task(&self, task_id: i64, patch: TaskPatch) -> TaskResult<Task> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let now = now_utc();

        self.with_tx(|tx| {
            let task = require_task(tx, task_id)?;

            let title = title.unwrap_or_else(|| task.title.clone());
            let description = match patch.description {
                Some(description) => clean_text(description),
                None => task.description.clone(),
            };
            let due_date = patch.due_date.unwrap_or(task.due_date);
            let urgent = patch.urgent.unwrap_or(task.urgent);

            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, urgent = ?4 WHERE id = ?5",
                params![title, description, due_date_to_sql(due_date), urgent, task_id],
            )?;

            if let Some(raw) = patch.tags {
                let tags = normalize_tags(raw.as_deref());
                tx.execute(
                    "UPDATE tasks SET tags = ?1 WHERE id = ?2",
                    params![tags, task_id],
                )?;
                ensure_raw_tags(tx, tags.as_deref())?;
            }

            if let Some(status) = patch.status {
                apply_status(tx, &task, status, now)?;
            }

            debug!(task_id, "Task updated");
            require_task(tx, task_id)
        })
    }

    /// Assign positions 1..N to the listed tasks that live in `status`.
    ///
    /// Ids in another column are skipped, unknown ids are ignored, and tasks
    /// of the column missing from the list keep their current index. Returns
    /// the known tasks in list order.
    pub fn reorder_tasks(&self, status: TaskStatus, ordered_ids: &[i64]) -> TaskResult<Vec<Task>> {
        self.with_tx(|tx| {
            let mut found: HashMap<i64, Task> = HashMap::new();
            for &task_id in ordered_ids {
                if found.contains_key(&task_id) {
                    continue;
                }
                if let Some(task) = get_task_internal(tx, task_id)? {
                    found.insert(task_id, task);
                }
            }

            for (position, task_id) in ordered_ids.iter().enumerate() {
                match found.get_mut(task_id) {
                    Some(task) if task.status == status => {
                        let order_index = position as i64 + 1;
                        tx.execute(
                            "UPDATE tasks SET order_index = ?1 WHERE id = ?2",
                            params![order_index, task_id],
                        )?;
                        task.order_index = order_index;
                    }
                    Some(task) => {
                        debug!(task_id, column = %task.status, target = %status, "Reorder skipped task from another column");
                    }
                    None => {
                        warn!(task_id, "Reorder skipped unknown task");
                    }
                }
            }

            Ok(ordered_ids
                .iter()
                .filter_map(|task_id| found.get(task_id).cloned())
                .collect())
        })
    }

    /// Two-stage delete: the first call archives the task, a second call on
    /// an archived task removes the row.
    pub fn delete_task(&self, task_id: i64) -> TaskResult<DeleteOutcome> {
        let now = now_utc();
        self.with_tx(|tx| {
            let task = require_task(tx, task_id)?;
            match lifecycle::delete_action(&task) {
                DeleteAction::SoftDelete => {
                    tx.execute(
                        "UPDATE tasks SET deleted_at = ?1 WHERE id = ?2",
                        params![now.timestamp_millis(), task_id],
                    )?;
                    debug!(task_id, "Task archived");
                    Ok(DeleteOutcome::Archived(Task {
                        deleted_at: Some(now),
                        ..task
                    }))
                }
                DeleteAction::Remove => {
                    tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
                    info!(task_id, "Task permanently deleted");
                    Ok(DeleteOutcome::Removed(task))
                }
            }
        })
    }

    /// Bring a task back to the end of the ToDo column, clearing its
    /// deletion and completion timestamps.
    pub fn restore_task(&self, task_id: i64) -> TaskResult<Task> {
        self.with_tx(|tx| {
            require_task(tx, task_id)?;
            let order_index = next_order_index(tx, RESTORE_STATUS)?;
            tx.execute(
                "UPDATE tasks SET deleted_at = NULL, done_at = NULL, status = ?1, order_index = ?2 WHERE id = ?3",
                params![RESTORE_STATUS, order_index, task_id],
            )?;
            debug!(task_id, order_index, "Task restored");
            require_task(tx, task_id)
        })
    }

    /// Permanently delete archived tasks. Returns the number removed.
    pub fn purge_archived(&self) -> TaskResult<usize> {
        self.purge_archived_at(now_utc())
    }

    /// Purge with an explicit clock reading. At most `scan_limit` rows are
    /// removed per call.
    pub fn purge_archived_at(&self, now: DateTime<Utc>) -> TaskResult<usize> {
        let cutoff = self.archive_policy().cutoff(now).timestamp_millis();
        let limit = self.archive_policy().scan_limit();
        let sql = format!(
            "DELETE FROM tasks WHERE id IN (SELECT id FROM tasks WHERE {} ORDER BY id LIMIT :limit)",
            ARCHIVED_PREDICATE
        );

        self.with_tx(|tx| {
            let deleted = tx.execute(&sql, named_params! { ":cutoff": cutoff, ":limit": limit })?;
            info!(deleted, "Purged archived tasks");
            Ok(deleted)
        })
    }

    /// Tasks on the board, in column and position order.
    pub fn list_active(&self, offset: i64, limit: i64) -> TaskResult<Vec<Task>> {
        self.list_active_at(now_utc(), offset, limit)
    }

    pub fn list_active_at(&self, now: DateTime<Utc>, offset: i64, limit: i64) -> TaskResult<Vec<Task>> {
        self.list_where(ACTIVE_PREDICATE, ACTIVE_ORDER, now, offset, limit)
    }

    /// Soft-deleted tasks and Done tasks past the archive window, most
    /// recently archived first.
    pub fn list_archived(&self, offset: i64, limit: i64) -> TaskResult<Vec<Task>> {
        self.list_archived_at(now_utc(), offset, limit)
    }

    pub fn list_archived_at(&self, now: DateTime<Utc>, offset: i64, limit: i64) -> TaskResult<Vec<Task>> {
        self.list_where(ARCHIVED_PREDICATE, ARCHIVED_ORDER, now, offset, limit)
    }

    fn list_where(
        &self,
        predicate: &str,
        order: &str,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> TaskResult<Vec<Task>> {
        let policy = self.archive_policy();
        let cutoff = policy.cutoff(now).timestamp_millis();
        let limit = limit.clamp(0, policy.scan_limit());
        let offset = offset.max(0);
        let sql = format!(
            "SELECT {} FROM tasks WHERE {} ORDER BY {} LIMIT :limit OFFSET :offset",
            TASK_COLUMNS, predicate, order
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(
                    named_params! { ":cutoff": cutoff, ":limit": limit, ":offset": offset },
                    parse_task_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(decode_error)?;
            Ok(tasks)
        })
    }
}
