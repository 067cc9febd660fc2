//! SQLite-backed key-value store.
//!
//! The timer core only needs three whole-record values (history, active
//! snapshot, settings); they live in a single `kv` table.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, PersistenceGateway};
use crate::error::StorageError;

/// SQLite database implementing [`PersistenceGateway`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/focusroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::OpenFailed {
            path: ".".into(),
            message: e.to_string(),
        })?;
        Self::open_at(&dir.join("focusroom.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate().map_err(|e| StorageError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::OpenFailed {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate().map_err(|e| StorageError::OpenFailed {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| rusqlite::Error::InvalidQuery)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn with_conn<T>(
        &self,
        key: &str,
        on_err: fn(&str, String) -> StorageError,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| on_err(key, "connection lock poisoned".into()))?;
        f(&conn).map_err(|e| on_err(key, e.to_string()))
    }
}

fn read_err(key: &str, message: String) -> StorageError {
    StorageError::read(key, message)
}

fn write_err(key: &str, message: String) -> StorageError {
    StorageError::write(key, message)
}

impl PersistenceGateway for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_conn(key, read_err, |conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(key, write_err, |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_conn(key, write_err, |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.get("test").unwrap().is_none());
        db.set("test", "hello").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "hello");
        db.set("test", "again").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn remove_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.set("k", "v").unwrap();
        db.remove("k").unwrap();
        db.remove("k").unwrap();
        assert!(db.get("k").unwrap().is_none());
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("focusroom.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set("focusroom.settings", r#"{"focusSeconds":60,"breakSeconds":30}"#)
                .unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert!(db.get("focusroom.settings").unwrap().unwrap().contains("60"));
    }
}
