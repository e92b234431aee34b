//! Order index allocation within a status column.

use super::Database;
use crate::error::TaskResult;
use crate::types::TaskStatus;
use rusqlite::{Connection, params};

/// Next free position in `status`: one past the current maximum, or 1 for an
/// empty column. Soft-deleted rows still count toward the maximum.
///
/// Must be called on the same transaction as the write that consumes the
/// index; the immediate transaction holds the write lock, so two writers
/// cannot be handed the same slot.
pub(crate) fn next_order_index(conn: &Connection, status: TaskStatus) -> rusqlite::Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(order_index) FROM tasks WHERE status = ?1",
        params![status],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

impl Database {
    /// Peek at the index the next task entering `status` would receive.
    pub fn next_order_index(&self, status: TaskStatus) -> TaskResult<i64> {
        self.with_conn(|conn| Ok(next_order_index(conn, status)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_column_starts_at_one() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.next_order_index(TaskStatus::ToDo).unwrap(), 1);
    }

    #[test]
    fn allocation_is_per_column() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO tasks (title, status, created_at, order_index) VALUES ('a', 'ToDo', 0, 4);
                 INSERT INTO tasks (title, status, created_at, order_index) VALUES ('b', 'Done', 0, 9);",
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.next_order_index(TaskStatus::ToDo).unwrap(), 5);
        assert_eq!(db.next_order_index(TaskStatus::Done).unwrap(), 10);
        assert_eq!(db.next_order_index(TaskStatus::InProgress).unwrap(), 1);
    }
}
