//! Adoption of databases created by the previous application.
//!
//! Those databases have a `tasks` table but no migration history, and may be
//! missing columns added over time. Refinery migrations use
//! `CREATE TABLE IF NOT EXISTS`, so the missing columns are added here first
//! and the versioned migrations then normalize the row data.

use rusqlite::{Connection, params};
use std::collections::HashSet;

/// Columns the task engine expects, with the definition used to add them.
const EXPECTED_COLUMNS: &[(&str, &str)] = &[
    ("description", "TEXT"),
    ("tags", "TEXT"),
    ("due_date", "TEXT"),
    ("status", "TEXT NOT NULL DEFAULT 'ToDo'"),
    ("created_at", "INTEGER"),
    ("order_index", "INTEGER"),
    ("done_at", "INTEGER"),
    ("deleted_at", "INTEGER"),
    ("urgent", "INTEGER NOT NULL DEFAULT 0"),
];

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

/// Add any missing columns to an unmanaged `tasks` table.
///
/// Does nothing on a fresh database or one already tracked by refinery.
/// Returns the names of the columns that were added.
pub fn adopt_legacy_schema(conn: &Connection) -> rusqlite::Result<Vec<&'static str>> {
    if !table_exists(conn, "tasks")? || table_exists(conn, "refinery_schema_history")? {
        return Ok(Vec::new());
    }

    let existing = column_names(conn, "tasks")?;
    let mut added = Vec::new();
    for (name, definition) in EXPECTED_COLUMNS {
        if !existing.contains(*name) {
            conn.execute_batch(&format!("ALTER TABLE tasks ADD COLUMN {} {};", name, definition))?;
            added.push(*name);
        }
    }
    Ok(added)
}
