//! Archive policy: which tasks belong on the board and which are archived.
//!
//! A task is archived when it has been soft-deleted, or when it has been
//! `Done` for longer than the archive window. Listing calls sample `now`
//! once and pass the resulting cutoff into SQL so a task cannot change
//! classification partway through a query.

use crate::types::{Task, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Default time a finished task stays on the board.
pub const DEFAULT_ARCHIVE_WINDOW_HOURS: i64 = 8;

/// Default cap on rows touched by archive scans.
pub const DEFAULT_SCAN_LIMIT: i64 = 10_000;

const MAX_WINDOW_HOURS: i64 = 24 * 365 * 100;

/// SQL predicate matching archived rows. Binds `:cutoff` (epoch ms).
/// Never evaluates to NULL, so `NOT (...)` is its exact complement.
pub(crate) const ARCHIVED_PREDICATE: &str = "(deleted_at IS NOT NULL \
     OR (status = 'Done' AND done_at IS NOT NULL AND done_at <= :cutoff))";

/// SQL predicate matching rows on the active board. Binds `:cutoff`.
pub(crate) const ACTIVE_PREDICATE: &str = "NOT (deleted_at IS NOT NULL \
     OR (status = 'Done' AND done_at IS NOT NULL AND done_at <= :cutoff))";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivePolicy {
    window: Duration,
    scan_limit: i64,
}

impl Default for ArchivePolicy {
    fn default() -> Self {
        Self::from_hours(DEFAULT_ARCHIVE_WINDOW_HOURS)
    }
}

impl ArchivePolicy {
    /// Negative windows are treated as zero; scan limits below one as one.
    pub fn new(window: Duration, scan_limit: i64) -> Self {
        Self {
            window: window.max(Duration::zero()),
            scan_limit: scan_limit.max(1),
        }
    }

    /// Windows beyond a century are capped there.
    pub fn from_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours.clamp(0, MAX_WINDOW_HOURS)), DEFAULT_SCAN_LIMIT)
    }

    pub fn with_scan_limit(self, scan_limit: i64) -> Self {
        Self::new(self.window, scan_limit)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn scan_limit(&self) -> i64 {
        self.scan_limit
    }

    /// Completion instant at or before which a Done task is archived.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    pub fn is_archived(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if task.deleted_at.is_some() {
            return true;
        }
        match (task.status, task.done_at) {
            (TaskStatus::Done, Some(done_at)) => done_at <= self.cutoff(now),
            _ => false,
        }
    }

    pub fn is_active(&self, task: &Task, now: DateTime<Utc>) -> bool {
        !self.is_archived(task, now)
    }

    /// When a Done task will leave the board on its own.
    /// `None` for soft-deleted tasks and tasks that are not Done.
    pub fn archives_at(&self, task: &Task) -> Option<DateTime<Utc>> {
        if task.deleted_at.is_some() || task.status != TaskStatus::Done {
            return None;
        }
        task.done_at.map(|done_at| done_at + self.window)
    }

    pub fn view(&self, task: Task) -> TaskView {
        TaskView {
            archives_at: self.archives_at(&task),
            task,
        }
    }
}

/// A task together with policy-derived fields, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub archives_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus, done_at: Option<DateTime<Utc>>, deleted_at: Option<DateTime<Utc>>) -> Task {
        Task {
            id: 1,
            title: "t".to_string(),
            description: None,
            tags: vec![],
            due_date: None,
            status,
            created_at: Utc::now() - Duration::days(1),
            order_index: 1,
            done_at,
            deleted_at,
            urgent: false,
        }
    }

    #[test]
    fn done_within_window_is_active() {
        let policy = ArchivePolicy::from_hours(8);
        let now = Utc::now();
        let t = task(TaskStatus::Done, Some(now - Duration::hours(1)), None);
        assert!(!policy.is_archived(&t, now));
        assert!(policy.is_active(&t, now));
    }

    #[test]
    fn done_past_window_is_archived() {
        let policy = ArchivePolicy::from_hours(8);
        let now = Utc::now();
        let t = task(TaskStatus::Done, Some(now - Duration::hours(9)), None);
        assert!(policy.is_archived(&t, now));
    }

    #[test]
    fn boundary_is_inclusive() {
        let policy = ArchivePolicy::from_hours(8);
        let now = Utc::now();
        let t = task(TaskStatus::Done, Some(now - Duration::hours(8)), None);
        assert!(policy.is_archived(&t, now));
    }

    #[test]
    fn soft_deleted_is_archived_in_any_status() {
        let policy = ArchivePolicy::default();
        let now = Utc::now();
        for status in TaskStatus::ALL {
            let t = task(status, None, Some(now));
            assert!(policy.is_archived(&t, now), "{status} should be archived");
        }
    }

    #[test]
    fn old_done_at_on_other_status_is_ignored() {
        let policy = ArchivePolicy::default();
        let now = Utc::now();
        let t = task(TaskStatus::ToDo, Some(now - Duration::days(30)), None);
        assert!(!policy.is_archived(&t, now));
    }

    #[test]
    fn archives_at_only_for_live_done_tasks() {
        let policy = ArchivePolicy::from_hours(8);
        let now = Utc::now();
        let done = task(TaskStatus::Done, Some(now), None);
        assert_eq!(policy.archives_at(&done), Some(now + Duration::hours(8)));

        let deleted = task(TaskStatus::Done, Some(now), Some(now));
        assert_eq!(policy.archives_at(&deleted), None);

        let todo = task(TaskStatus::ToDo, None, None);
        assert_eq!(policy.archives_at(&todo), None);
    }

    #[test]
    fn negative_window_is_clamped() {
        let policy = ArchivePolicy::new(Duration::hours(-3), 0);
        assert_eq!(policy.window(), Duration::zero());
        assert_eq!(policy.scan_limit(), 1);
    }

    #[test]
    fn view_serializes_flat() {
        let policy = ArchivePolicy::default();
        let view = policy.view(task(TaskStatus::ToDo, None, None));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "ToDo");
        assert_eq!(json["order_index"], 1);
        assert!(json["archives_at"].is_null());
    }
}
