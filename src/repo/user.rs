use rusqlite::{Connection, OptionalExtension};
use crate::error::{LedgerError, LedgerResult};
use crate::models::User;

/// User repository for database operations
pub struct UserRepo;

impl UserRepo {
    /// Return the user with this username, creating it on first login.
    /// Usernames match exactly (case-sensitive). The display name defaults
    /// to the username and is only applied on creation.
    pub fn login_or_create(conn: &Connection, username: &str, display_name: Option<&str>) -> LedgerResult<User> {
        if username.trim().is_empty() {
            return Err(LedgerError::validation("Username cannot be empty"));
        }

        if let Some(user) = Self::get_by_username(conn, username)? {
            log::debug!("User '{}' already exists (id {})", username, user.id);
            return Ok(user);
        }

        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(username);
        let now = chrono::Utc::now().timestamp();

        // OR IGNORE: a concurrent login may have created the row already
        conn.execute(
            "INSERT OR IGNORE INTO users (username, display_name, created_ts) VALUES (?1, ?2, ?3)",
            rusqlite::params![username, display_name, now],
        )?;

        let user = Self::get_by_username(conn, username)?
            .ok_or_else(|| LedgerError::Internal(rusqlite::Error::QueryReturnedNoRows))?;
        log::info!("Created user '{}' (id {})", user.username, user.id);
        Ok(user)
    }

    /// Get user by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> LedgerResult<Option<User>> {
        let user = conn.query_row(
            "SELECT id, username, display_name, created_ts FROM users WHERE id = ?1",
            [id],
            Self::row_to_user,
        ).optional()?;
        Ok(user)
    }

    /// Get user by exact username
    pub fn get_by_username(conn: &Connection, username: &str) -> LedgerResult<Option<User>> {
        let user = conn.query_row(
            "SELECT id, username, display_name, created_ts FROM users WHERE username = ?1",
            [username],
            Self::row_to_user,
        ).optional()?;
        Ok(user)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            display_name: row.get(2)?,
            created_ts: row.get(3)?,
        })
    }
}
