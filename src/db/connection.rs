use rusqlite::Connection;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::db::migrations::MigrationManager;

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    /// Directory holding the rc file, the default database and the session file
    pub fn data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine the home directory")?;
        Ok(home.join(".dayledger"))
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("ledger.db"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("rc"))
    }

    /// Get database path from configuration file or default
    pub fn resolve_path() -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let config = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            if let Some(path) = Self::parse_data_location(&config, &config_path) {
                return Ok(path);
            }
        }

        Self::default_path()
    }

    /// Extract `data.location=` from rc contents.
    /// Relative paths resolve against the directory holding the rc file.
    fn parse_data_location(config: &str, config_path: &Path) -> Option<PathBuf> {
        for line in config.lines() {
            let line = line.trim();
            if let Some(path_str) = line.strip_prefix("data.location=") {
                let path = PathBuf::from(path_str.trim());
                if path.is_relative() {
                    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
                    return Some(base.join(path));
                }
                return Some(path);
            }
        }
        None
    }

    /// Connect to the database, creating it and parent directories if needed
    pub fn connect() -> Result<Connection> {
        let db_path = Self::resolve_path()?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        log::debug!("Opened ledger at {}", db_path.display());

        Self::prepare(&conn)?;
        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        Self::prepare(&conn)?;
        Ok(conn)
    }

    fn prepare(conn: &Connection) -> Result<()> {
        // Foreign keys are per-connection and cannot be toggled inside a transaction
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .context("Failed to enable foreign keys")?;

        MigrationManager::initialize(conn)
            .context("Failed to initialize database schema")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_relative_data_location() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("rc");

        let path = DbConnection::parse_data_location("data.location=./custom.db\n", &config_file).unwrap();
        assert_eq!(path, temp_dir.path().join("./custom.db"));
    }

    #[test]
    fn test_parse_absolute_data_location() {
        let path = DbConnection::parse_data_location(
            "# comment\ndata.location=/var/tmp/ledger.db\n",
            Path::new("/home/ana/.dayledger/rc"),
        ).unwrap();
        assert_eq!(path, PathBuf::from("/var/tmp/ledger.db"));
    }

    #[test]
    fn test_parse_without_data_location() {
        assert!(DbConnection::parse_data_location("other=1\n", Path::new("rc")).is_none());
    }

    #[test]
    fn test_connect_creates_schema_on_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let conn = Connection::open(&db_path).unwrap();
        DbConnection::prepare(&conn).unwrap();

        assert!(db_path.exists());
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_connect_in_memory_enables_foreign_keys() {
        let conn = DbConnection::connect_in_memory().unwrap();

        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }
}
