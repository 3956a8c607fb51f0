use rusqlite::{Connection, ErrorCode, OptionalExtension};
use crate::error::{LedgerError, LedgerResult};
use crate::models::Timer;
use crate::repo::TaskRepo;

const TIMER_COLUMNS: &str =
    "tm.id, tm.task_id, tm.start_ts, tm.end_ts, tm.duration_secs, tm.created_ts, tm.modified_ts";

/// Timer repository for database operations.
///
/// `start_ts` and `duration_secs` are the single source of truth. Writes use
/// compare-and-set predicates so that concurrent start/stop attempts on the
/// same timer resolve to one winner instead of double counting.
pub struct TimerRepo;

impl TimerRepo {
    /// Create the timer for a task.
    /// Returns a conflict if the task already has one.
    pub fn create(conn: &Connection, user_id: i64, task_id: i64) -> LedgerResult<Timer> {
        TaskRepo::require_owned(conn, user_id, task_id)?;

        if let Some(existing) = Self::get_for_task(conn, task_id)? {
            return Err(LedgerError::conflict(format!(
                "Task {} already has a timer ({})",
                task_id,
                existing.id.unwrap_or_default()
            )));
        }

        let mut timer = Timer::new(task_id, chrono::Utc::now().timestamp());
        conn.execute(
            "INSERT INTO timers (task_id, start_ts, end_ts, duration_secs, created_ts, modified_ts)
             VALUES (?1, NULL, NULL, 0, ?2, ?3)",
            rusqlite::params![task_id, timer.created_ts, timer.modified_ts],
        )
        .map_err(|e| match e {
            // Lost a race with another create for the same task
            rusqlite::Error::SqliteFailure(ref failure, _) if failure.code == ErrorCode::ConstraintViolation => {
                LedgerError::conflict(format!("Task {} already has a timer", task_id))
            }
            other => LedgerError::from(other),
        })?;

        let id = conn.last_insert_rowid();
        timer.id = Some(id);
        log::info!("Created timer {} for task {}", id, task_id);
        Ok(timer)
    }

    /// Get a timer whose task belongs to `user_id`
    pub fn get(conn: &Connection, user_id: i64, timer_id: i64) -> LedgerResult<Timer> {
        let timer = conn.query_row(
            &format!(
                "SELECT {} FROM timers tm JOIN tasks t ON tm.task_id = t.id
                 WHERE tm.id = ?1 AND t.user_id = ?2",
                TIMER_COLUMNS
            ),
            rusqlite::params![timer_id, user_id],
            Self::row_to_timer,
        ).optional()?;
        timer.ok_or_else(|| LedgerError::not_found("Timer", timer_id))
    }

    /// Get the timer attached to a task, if any (no ownership check)
    pub fn get_for_task(conn: &Connection, task_id: i64) -> LedgerResult<Option<Timer>> {
        let timer = conn.query_row(
            &format!("SELECT {} FROM timers tm WHERE tm.task_id = ?1", TIMER_COLUMNS),
            [task_id],
            Self::row_to_timer,
        ).optional()?;
        Ok(timer)
    }

    /// All running timers of a user, across days
    pub fn list_running(conn: &Connection, user_id: i64) -> LedgerResult<Vec<Timer>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM timers tm JOIN tasks t ON tm.task_id = t.id
             WHERE t.user_id = ?1 AND tm.start_ts IS NOT NULL
             ORDER BY tm.start_ts",
            TIMER_COLUMNS
        ))?;
        let rows = stmt.query_map([user_id], Self::row_to_timer)?;

        let mut timers = Vec::new();
        for row in rows {
            timers.push(row?);
        }
        Ok(timers)
    }

    /// Persist the start of a run. Only an idle timer is updated;
    /// returns false if the timer was already running.
    pub fn set_running(conn: &Connection, timer_id: i64, start_ts: i64) -> LedgerResult<bool> {
        let changed = conn.execute(
            "UPDATE timers SET start_ts = ?1, end_ts = NULL, modified_ts = ?1
             WHERE id = ?2 AND start_ts IS NULL",
            rusqlite::params![start_ts, timer_id],
        )?;
        Ok(changed == 1)
    }

    /// Persist the end of the run that began at `started_at`: new total
    /// duration, end time and cleared start in one write. Returns false if
    /// the run was already closed by someone else.
    pub fn set_stopped(conn: &Connection, timer_id: i64, started_at: i64, end_ts: i64, duration_secs: i64) -> LedgerResult<bool> {
        let changed = conn.execute(
            "UPDATE timers SET start_ts = NULL, end_ts = ?1, duration_secs = ?2, modified_ts = ?1
             WHERE id = ?3 AND start_ts = ?4",
            rusqlite::params![end_ts, duration_secs, timer_id, started_at],
        )?;
        Ok(changed == 1)
    }

    /// Start a run at `now`. Starting a running timer is a no-op that
    /// returns the timer unchanged.
    pub fn start(conn: &Connection, user_id: i64, timer_id: i64, now: i64) -> LedgerResult<Timer> {
        let tx = conn.unchecked_transaction()?;
        let mut timer = Self::get(&tx, user_id, timer_id)?;

        if !timer.start(now) {
            log::debug!("Timer {} already running since {:?}", timer_id, timer.start_ts);
            return Ok(timer);
        }
        if !Self::set_running(&tx, timer_id, now)? {
            drop(tx);
            log::debug!("Timer {} was started concurrently", timer_id);
            return Self::get(conn, user_id, timer_id);
        }
        tx.commit()?;

        log::info!("Started timer {} (task {})", timer_id, timer.task_id);
        Ok(timer)
    }

    /// Stop the current run at `now`.
    ///
    /// The added time is always `now - start_ts` from the stored start.
    /// `reported_elapsed` is a caller-side measurement kept only as a hint:
    /// a mismatch is logged and the stored computation wins. Stopping an
    /// idle timer is a conflict and changes nothing.
    pub fn stop(conn: &Connection, user_id: i64, timer_id: i64, now: i64, reported_elapsed: Option<i64>) -> LedgerResult<Timer> {
        let tx = conn.unchecked_transaction()?;
        let mut timer = Self::get(&tx, user_id, timer_id)?;

        let started_at = timer.start_ts;
        let added = timer.stop(now)?;

        if let Some(reported) = reported_elapsed {
            if reported != added {
                log::warn!(
                    "Timer {}: reported elapsed {}s differs from recorded {}s, keeping recorded",
                    timer_id, reported, added
                );
            }
        }

        let applied = match started_at {
            Some(started_at) => Self::set_stopped(&tx, timer_id, started_at, now, timer.duration_secs)?,
            None => false,
        };
        if !applied {
            return Err(LedgerError::conflict(format!("Timer {} is not running", timer_id)));
        }
        tx.commit()?;

        log::info!("Stopped timer {} (+{}s, total {}s)", timer_id, added, timer.duration_secs);
        Ok(timer)
    }

    fn row_to_timer(row: &rusqlite::Row) -> rusqlite::Result<Timer> {
        Ok(Timer {
            id: Some(row.get(0)?),
            task_id: row.get(1)?,
            start_ts: row.get(2)?,
            end_ts: row.get(3)?,
            duration_secs: row.get(4)?,
            created_ts: row.get(5)?,
            modified_ts: row.get(6)?,
        })
    }
}
