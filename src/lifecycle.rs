//! Pure transition rules for the task lifecycle.
//!
//! The database layer loads a task, asks these functions what the next state
//! looks like, then writes it back inside the same transaction.

use crate::types::{Task, TaskStatus};
use chrono::{DateTime, Utc};

/// Result of applying a status to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: TaskStatus,
    pub done_at: Option<DateTime<Utc>>,
    /// The task moves to another column and needs a fresh order index.
    pub needs_slot: bool,
}

/// Completion timestamp a task should carry after moving from `current` to
/// `next`. Done iff non-null; staying in Done keeps the original timestamp
/// and only backfills a missing one.
pub fn completion_after(
    current: TaskStatus,
    current_done_at: Option<DateTime<Utc>>,
    next: TaskStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match next {
        TaskStatus::Done if current == TaskStatus::Done => Some(current_done_at.unwrap_or(now)),
        TaskStatus::Done => Some(now),
        TaskStatus::ToDo | TaskStatus::InProgress => None,
    }
}

pub fn plan_status_change(task: &Task, next: TaskStatus, now: DateTime<Utc>) -> StatusChange {
    StatusChange {
        status: next,
        done_at: completion_after(task.status, task.done_at, next, now),
        needs_slot: task.status != next,
    }
}

/// What a delete request does to a task in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Set `deleted_at`; the row stays in the archive.
    SoftDelete,
    /// Already soft-deleted: remove the row.
    Remove,
}

pub fn delete_action(task: &Task) -> DeleteAction {
    if task.deleted_at.is_some() {
        DeleteAction::Remove
    } else {
        DeleteAction::SoftDelete
    }
}

/// Column a restored task returns to.
pub const RESTORE_STATUS: TaskStatus = TaskStatus::ToDo;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(status: TaskStatus, done_at: Option<DateTime<Utc>>) -> Task {
        Task {
            id: 7,
            title: "t".to_string(),
            description: None,
            tags: vec![],
            due_date: None,
            status,
            created_at: Utc::now(),
            order_index: 3,
            done_at,
            deleted_at: None,
            urgent: false,
        }
    }

    #[test]
    fn moving_to_done_stamps_completion() {
        let now = Utc::now();
        let change = plan_status_change(&task(TaskStatus::ToDo, None), TaskStatus::Done, now);
        assert_eq!(change.done_at, Some(now));
        assert!(change.needs_slot);
    }

    #[test]
    fn leaving_done_clears_completion() {
        let now = Utc::now();
        let t = task(TaskStatus::Done, Some(now - Duration::hours(2)));
        let change = plan_status_change(&t, TaskStatus::InProgress, now);
        assert_eq!(change.done_at, None);
        assert!(change.needs_slot);
    }

    #[test]
    fn staying_done_keeps_original_completion() {
        let now = Utc::now();
        let earlier = now - Duration::hours(2);
        let change = plan_status_change(&task(TaskStatus::Done, Some(earlier)), TaskStatus::Done, now);
        assert_eq!(change.done_at, Some(earlier));
        assert!(!change.needs_slot);
    }

    #[test]
    fn staying_done_backfills_missing_completion() {
        let now = Utc::now();
        let change = plan_status_change(&task(TaskStatus::Done, None), TaskStatus::Done, now);
        assert_eq!(change.done_at, Some(now));
        assert!(!change.needs_slot);
    }

    #[test]
    fn unchanged_open_status_is_noop() {
        let now = Utc::now();
        let change = plan_status_change(&task(TaskStatus::InProgress, None), TaskStatus::InProgress, now);
        assert_eq!(change.done_at, None);
        assert!(!change.needs_slot);
    }

    #[test]
    fn second_delete_removes() {
        let mut t = task(TaskStatus::ToDo, None);
        assert_eq!(delete_action(&t), DeleteAction::SoftDelete);
        t.deleted_at = Some(Utc::now());
        assert_eq!(delete_action(&t), DeleteAction::Remove);
    }
}
