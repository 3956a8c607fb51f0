use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{NewTag, NewTask, Task, TaskEntry, TaskUpdate};
use crate::repo::{TagRepo, TimerRepo, UserRepo};
use crate::utils::{format_day, DAY_FORMAT};

const TASK_COLUMNS: &str =
    "id, uuid, user_id, title, description, day, completed, created_ts, modified_ts";

/// Task repository for database operations.
/// Every public operation is scoped to the owning user; a task owned by
/// someone else is reported as not found.
pub struct TaskRepo;

impl TaskRepo {
    /// Create a task with its tags
    pub fn create(conn: &Connection, user_id: i64, new_task: &NewTask) -> LedgerResult<TaskEntry> {
        let task = Self::build(conn, user_id, new_task)?;

        let tx = conn.unchecked_transaction()?;
        let id = Self::insert(&tx, &task, &new_task.tags)?;
        tx.commit()?;

        log::info!("Created task {} on {} for user {}", id, format_day(task.day), user_id);
        Self::get(conn, user_id, id)
    }

    /// Validate input and build the unsaved task
    fn build(conn: &Connection, user_id: i64, new_task: &NewTask) -> LedgerResult<Task> {
        if new_task.title.trim().is_empty() {
            return Err(LedgerError::validation("Title cannot be empty"));
        }
        let day = new_task.day
            .ok_or_else(|| LedgerError::validation("Date is required"))?;
        for tag in &new_task.tags {
            tag.validate()?;
        }
        if UserRepo::get_by_id(conn, user_id)?.is_none() {
            return Err(LedgerError::not_found("User", user_id));
        }

        let mut task = Task::new(user_id, new_task.title.trim().to_string(), day);
        task.description = normalize_description(new_task.description.clone());
        Ok(task)
    }

    /// Insert task row and tags. Callers provide the transaction.
    fn insert(conn: &Connection, task: &Task, tags: &[NewTag]) -> LedgerResult<i64> {
        conn.execute(
            "INSERT INTO tasks (uuid, user_id, title, description, day, completed, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                task.uuid,
                task.user_id,
                task.title,
                task.description,
                format_day(task.day),
                task.completed,
                task.created_ts,
                task.modified_ts
            ],
        )?;
        let id = conn.last_insert_rowid();
        TagRepo::write_all(conn, id, tags)?;
        Ok(id)
    }

    /// Get a task with its timer and tags
    pub fn get(conn: &Connection, user_id: i64, task_id: i64) -> LedgerResult<TaskEntry> {
        let task = Self::require_owned(conn, user_id, task_id)?;
        Self::load_entry(conn, task)
    }

    /// Apply a partial update. Field changes and tag replacement commit together.
    pub fn update(conn: &Connection, user_id: i64, task_id: i64, update: &TaskUpdate) -> LedgerResult<TaskEntry> {
        Self::require_owned(conn, user_id, task_id)?;

        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(LedgerError::validation("Title cannot be empty"));
            }
        }
        if update.is_empty() {
            return Self::get(conn, user_id, task_id);
        }

        let now = chrono::Utc::now().timestamp();
        let tx = conn.unchecked_transaction()?;

        if let Some(title) = &update.title {
            tx.execute(
                "UPDATE tasks SET title = ?1 WHERE id = ?2",
                rusqlite::params![title.trim(), task_id],
            )?;
        }
        if let Some(description) = &update.description {
            tx.execute(
                "UPDATE tasks SET description = ?1 WHERE id = ?2",
                rusqlite::params![normalize_description(description.clone()), task_id],
            )?;
        }
        if let Some(completed) = update.completed {
            tx.execute(
                "UPDATE tasks SET completed = ?1 WHERE id = ?2",
                rusqlite::params![completed, task_id],
            )?;
        }
        if let Some(tags) = &update.tags {
            TagRepo::write_all(&tx, task_id, tags)?;
        }
        tx.execute(
            "UPDATE tasks SET modified_ts = ?1 WHERE id = ?2",
            rusqlite::params![now, task_id],
        )?;
        tx.commit()?;

        log::debug!("Updated task {}", task_id);
        Self::get(conn, user_id, task_id)
    }

    /// Delete a task; its timer and tags go with it
    pub fn delete(conn: &Connection, user_id: i64, task_id: i64) -> LedgerResult<()> {
        Self::require_owned(conn, user_id, task_id)?;
        conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![task_id, user_id],
        )?;
        log::info!("Deleted task {}", task_id);
        Ok(())
    }

    /// Tasks of one day, newest first
    pub fn list_for_day(conn: &Connection, user_id: i64, day: NaiveDate) -> LedgerResult<Vec<TaskEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 AND day = ?2 ORDER BY created_ts DESC, id DESC",
            TASK_COLUMNS
        ))?;
        let rows = stmt.query_map(rusqlite::params![user_id, format_day(day)], Self::row_to_task)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::load_entry(conn, row?)?);
        }
        Ok(entries)
    }

    /// Carry a task over to another day: a copy (title, description, tags,
    /// no timer) is created on `to_day` and the original is marked completed.
    pub fn migrate(conn: &Connection, user_id: i64, task_id: i64, to_day: NaiveDate) -> LedgerResult<TaskEntry> {
        let original = Self::get(conn, user_id, task_id)?;

        let copy_tags: Vec<NewTag> = original.tags.iter().map(NewTag::from).collect();
        let copy = Self::build(conn, user_id, &NewTask {
            title: original.task.title.clone(),
            description: original.task.description.clone(),
            day: Some(to_day),
            tags: copy_tags.clone(),
        })?;

        let tx = conn.unchecked_transaction()?;
        let copy_id = Self::insert(&tx, &copy, &copy_tags)?;
        tx.execute(
            "UPDATE tasks SET completed = 1, modified_ts = ?1 WHERE id = ?2",
            rusqlite::params![chrono::Utc::now().timestamp(), task_id],
        )?;
        tx.commit()?;

        log::info!("Migrated task {} to {} as task {}", task_id, format_day(to_day), copy_id);
        Self::get(conn, user_id, copy_id)
    }

    /// Fetch the bare task or fail with NotFound when it is missing or foreign
    pub fn require_owned(conn: &Connection, user_id: i64, task_id: i64) -> LedgerResult<Task> {
        let task = conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2", TASK_COLUMNS),
            rusqlite::params![task_id, user_id],
            Self::row_to_task,
        ).optional()?;
        task.ok_or_else(|| LedgerError::not_found("Task", task_id))
    }

    fn load_entry(conn: &Connection, task: Task) -> LedgerResult<TaskEntry> {
        let task_id = task.id.unwrap_or_default();
        let timer = TimerRepo::get_for_task(conn, task_id)?;
        let tags = TagRepo::get_by_task(conn, task_id)?;
        Ok(TaskEntry { task, timer, tags })
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let day_str: String = row.get(5)?;
        let day = NaiveDate::parse_from_str(&day_str, DAY_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Task {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            user_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            day,
            completed: row.get(6)?,
            created_ts: row.get(7)?,
            modified_ts: row.get(8)?,
        })
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::NewTag;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn setup() -> (Connection, i64) {
        let conn = DbConnection::connect_in_memory().unwrap();
        let user = UserRepo::login_or_create(&conn, "ana", None).unwrap();
        (conn, user.id)
    }

    fn new_task(title: &str, d: u32) -> NewTask {
        NewTask {
            title: title.to_string(),
            day: Some(day(d)),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_task_with_tags() {
        let (conn, user_id) = setup();
        let entry = TaskRepo::create(&conn, user_id, &NewTask {
            title: "  Write report ".to_string(),
            description: Some("Q1 numbers".to_string()),
            day: Some(day(10)),
            tags: vec![NewTag::new("pessoa", "Ana"), NewTag::new("tipo", "escrita")],
        }).unwrap();

        assert_eq!(entry.task.title, "Write report");
        assert_eq!(entry.task.description.as_deref(), Some("Q1 numbers"));
        assert_eq!(entry.task.day, day(10));
        assert!(!entry.task.completed);
        assert!(entry.timer.is_none());
        assert_eq!(entry.tags.len(), 2);
        assert_eq!(entry.tags[0].color, "#f59e0b");
    }

    #[test]
    fn test_create_requires_title_and_date() {
        let (conn, user_id) = setup();

        let result = TaskRepo::create(&conn, user_id, &new_task("   ", 10));
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        let result = TaskRepo::create(&conn, user_id, &NewTask { title: "x".to_string(), ..Default::default() });
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_create_for_unknown_user() {
        let (conn, _user_id) = setup();
        let result = TaskRepo::create(&conn, 999, &new_task("Task", 10));
        assert!(matches!(result, Err(LedgerError::NotFound { entity: "User", id: 999 })));
    }

    #[test]
    fn test_get_foreign_task_is_not_found() {
        let (conn, user_id) = setup();
        let other = UserRepo::login_or_create(&conn, "bia", None).unwrap();
        let entry = TaskRepo::create(&conn, user_id, &new_task("Mine", 10)).unwrap();

        let result = TaskRepo::get(&conn, other.id, entry.id());
        assert!(matches!(result, Err(LedgerError::NotFound { entity: "Task", .. })));
    }

    #[test]
    fn test_update_fields() {
        let (conn, user_id) = setup();
        let entry = TaskRepo::create(&conn, user_id, &new_task("Draft", 10)).unwrap();

        let updated = TaskRepo::update(&conn, user_id, entry.id(), &TaskUpdate {
            title: Some("Final".to_string()),
            description: Some(Some("details".to_string())),
            completed: Some(true),
            tags: Some(vec![NewTag::new("urgencia", "alta")]),
        }).unwrap();

        assert_eq!(updated.task.title, "Final");
        assert_eq!(updated.task.description.as_deref(), Some("details"));
        assert!(updated.task.completed);
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].tag_type, "urgencia");

        let cleared = TaskRepo::update(&conn, user_id, entry.id(), &TaskUpdate {
            description: Some(None),
            ..Default::default()
        }).unwrap();
        assert!(cleared.task.description.is_none());
        assert_eq!(cleared.tags.len(), 1);
    }

    #[test]
    fn test_update_with_bad_tag_changes_nothing() {
        let (conn, user_id) = setup();
        let entry = TaskRepo::create(&conn, user_id, &new_task("Draft", 10)).unwrap();

        let bad = NewTag { tag_type: "".to_string(), value: "x".to_string() };
        let result = TaskRepo::update(&conn, user_id, entry.id(), &TaskUpdate {
            title: Some("Changed".to_string()),
            tags: Some(vec![bad]),
            ..Default::default()
        });
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        let unchanged = TaskRepo::get(&conn, user_id, entry.id()).unwrap();
        assert_eq!(unchanged.task.title, "Draft");
    }

    #[test]
    fn test_list_for_day_scopes_user_and_day() {
        let (conn, user_id) = setup();
        let other = UserRepo::login_or_create(&conn, "bia", None).unwrap();

        let first = TaskRepo::create(&conn, user_id, &new_task("First", 10)).unwrap();
        let second = TaskRepo::create(&conn, user_id, &new_task("Second", 10)).unwrap();
        TaskRepo::create(&conn, user_id, &new_task("Other day", 11)).unwrap();
        TaskRepo::create(&conn, other.id, &new_task("Other user", 10)).unwrap();

        let entries = TaskRepo::list_for_day(&conn, user_id, day(10)).unwrap();
        let ids: Vec<i64> = entries.iter().map(|e| e.id()).collect();
        // Newest first
        assert_eq!(ids, vec![second.id(), first.id()]);
    }

    #[test]
    fn test_delete_cascades_timer_and_tags() {
        let (conn, user_id) = setup();
        let mut task = new_task("Temp", 10);
        task.tags = vec![NewTag::new("pessoa", "Ana")];
        let entry = TaskRepo::create(&conn, user_id, &task).unwrap();
        let timer = TimerRepo::create(&conn, user_id, entry.id()).unwrap();

        TaskRepo::delete(&conn, user_id, entry.id()).unwrap();

        let result = TimerRepo::get(&conn, user_id, timer.id.unwrap());
        assert!(matches!(result, Err(LedgerError::NotFound { entity: "Timer", .. })));
        assert!(TagRepo::get_by_task(&conn, entry.id()).unwrap().is_empty());
        assert!(matches!(
            TaskRepo::get(&conn, user_id, entry.id()),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_foreign_task_is_not_found() {
        let (conn, user_id) = setup();
        let other = UserRepo::login_or_create(&conn, "bia", None).unwrap();
        let entry = TaskRepo::create(&conn, user_id, &new_task("Mine", 10)).unwrap();

        assert!(TaskRepo::delete(&conn, other.id, entry.id()).is_err());
        assert!(TaskRepo::get(&conn, user_id, entry.id()).is_ok());
    }

    #[test]
    fn test_migrate_copies_and_completes() {
        let (conn, user_id) = setup();
        let mut task = new_task("Carry over", 10);
        task.description = Some("notes".to_string());
        task.tags = vec![NewTag::new("pessoa", "Ana"), NewTag::new("tipo", "revisão")];
        let original = TaskRepo::create(&conn, user_id, &task).unwrap();
        TimerRepo::create(&conn, user_id, original.id()).unwrap();

        let copy = TaskRepo::migrate(&conn, user_id, original.id(), day(11)).unwrap();

        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.task.day, day(11));
        assert_eq!(copy.task.title, "Carry over");
        assert_eq!(copy.task.description.as_deref(), Some("notes"));
        assert!(!copy.task.completed);
        assert!(copy.timer.is_none());
        let copied: Vec<(&str, &str)> = copy.tags.iter()
            .map(|t| (t.tag_type.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(copied, vec![("pessoa", "Ana"), ("tipo", "revisão")]);

        let original = TaskRepo::get(&conn, user_id, original.id()).unwrap();
        assert!(original.task.completed);
        assert!(original.timer.is_some());
    }
}
