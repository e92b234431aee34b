//! Canonical tag storage for autocomplete suggestions.

use super::Database;
use crate::error::TaskResult;
use crate::tags::{dedupe_tags, parse_tags, sort_tags, tag_key};
use rusqlite::{Connection, params};
use std::collections::HashSet;
use tracing::debug;

fn existing_keys(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM tags")?;
    let keys = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .map(|name| name.map(|n| tag_key(&n)))
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(keys)
}

/// Insert each tag that has no case-insensitive match yet, verbatim.
/// Returns the number of new canonical tags.
pub(crate) fn ensure_tags(conn: &Connection, tags: &[String]) -> rusqlite::Result<usize> {
    if tags.is_empty() {
        return Ok(0);
    }
    let mut known = existing_keys(conn)?;
    let mut inserted = 0;
    for tag in tags {
        if known.insert(tag_key(tag)) {
            // The NOCASE unique index backs up the key check for ASCII.
            inserted += conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![tag])?;
        }
    }
    if inserted > 0 {
        debug!(count = inserted, "Stored new canonical tags");
    }
    Ok(inserted)
}

/// Parse a raw tag string and persist any unseen tags.
pub(crate) fn ensure_raw_tags(conn: &Connection, raw: Option<&str>) -> rusqlite::Result<usize> {
    ensure_tags(conn, &parse_tags(raw))
}

impl Database {
    /// Persist canonical entries for every tag in `raw` not seen before.
    pub fn ensure_tags(&self, raw: Option<&str>) -> TaskResult<usize> {
        self.with_tx(|tx| Ok(ensure_raw_tags(tx, raw)?))
    }

    /// All known tags for autocomplete, sorted case-insensitively.
    ///
    /// Tags present on tasks but missing from the tag table are materialized
    /// as a side effect.
    pub fn list_tag_suggestions(&self) -> TaskResult<Vec<String>> {
        self.with_tx(|tx| {
            let task_tags: Vec<String> = {
                let mut stmt =
                    tx.prepare("SELECT tags FROM tasks WHERE tags IS NOT NULL AND tags != '' ORDER BY id")?;
                let raw = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                raw.iter().flat_map(|s| parse_tags(Some(s))).collect()
            };
            ensure_tags(tx, &dedupe_tags(task_tags))?;

            let mut stmt = tx.prepare("SELECT name FROM tags ORDER BY id")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let mut suggestions = dedupe_tags(names);
            sort_tags(&mut suggestions);
            Ok(suggestions)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_tags(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?))
            .unwrap()
    }

    #[test]
    fn ensure_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.ensure_tags(Some("Alpha, beta")).unwrap(), 2);
        assert_eq!(db.ensure_tags(Some("alpha")).unwrap(), 0);
        assert_eq!(count_tags(&db), 2);
        assert_eq!(db.list_tag_suggestions().unwrap(), vec!["Alpha", "beta"]);
    }

    #[test]
    fn duplicates_within_one_input_store_once() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.ensure_tags(Some("Ops, OPS, ops")).unwrap(), 1);
        assert_eq!(db.list_tag_suggestions().unwrap(), vec!["Ops"]);
    }

    #[test]
    fn suggestions_backfill_from_tasks() {
        let db = Database::open_in_memory().unwrap();
        db.ensure_tags(Some("zeta")).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, tags, status, created_at, order_index) VALUES ('x', 'Beta, ZETA', 'ToDo', 0, 1)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.list_tag_suggestions().unwrap(), vec!["Beta", "zeta"]);
        assert_eq!(count_tags(&db), 2);
    }
}
