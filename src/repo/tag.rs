use rusqlite::Connection;
use crate::error::LedgerResult;
use crate::models::{NewTag, Tag};
use crate::repo::TaskRepo;

/// Tag repository for database operations
pub struct TagRepo;

impl TagRepo {
    /// Get tags for a task in insertion order
    pub fn get_by_task(conn: &Connection, task_id: i64) -> LedgerResult<Vec<Tag>> {
        let mut stmt = conn.prepare(
            "SELECT id, task_id, type, value, color FROM task_tags WHERE task_id = ?1 ORDER BY id"
        )?;
        let rows = stmt.query_map([task_id], |row| {
            Ok(Tag {
                id: Some(row.get(0)?),
                task_id: row.get(1)?,
                tag_type: row.get(2)?,
                value: row.get(3)?,
                color: row.get(4)?,
            })
        })?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    /// Replace every tag on a task owned by `user_id`.
    /// Either all old tags are gone and all new tags are stored, or nothing changes.
    pub fn replace(conn: &Connection, user_id: i64, task_id: i64, tags: &[NewTag]) -> LedgerResult<Vec<Tag>> {
        TaskRepo::require_owned(conn, user_id, task_id)?;

        let tx = conn.unchecked_transaction()?;
        Self::write_all(&tx, task_id, tags)?;
        tx.commit()?;

        log::debug!("Replaced tags on task {} ({} tags)", task_id, tags.len());
        Self::get_by_task(conn, task_id)
    }

    /// Delete-all then insert-all. Callers provide the transaction.
    pub(crate) fn write_all(conn: &Connection, task_id: i64, tags: &[NewTag]) -> LedgerResult<()> {
        for tag in tags {
            tag.validate()?;
        }

        conn.execute("DELETE FROM task_tags WHERE task_id = ?1", [task_id])?;
        for tag in tags {
            conn.execute(
                "INSERT INTO task_tags (task_id, type, value, color) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![task_id, tag.tag_type, tag.value, tag.color()],
            )?;
        }
        Ok(())
    }
}
