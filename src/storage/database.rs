//! SQLite-backed item store

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::config::Settings;
use crate::storage::store::{item_key, PersistenceError, SummaryStore};

/// Database wrapper for calldigest
pub struct Database {
    conn: Mutex<Connection>,
}

const CURRENT_SCHEMA_VERSION: i64 = 1;

impl Database {
    /// Open or create the database
    pub fn open(settings: &Settings) -> Result<Self, PersistenceError> {
        let db_path = settings.database_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open_path(&db_path)
    }

    /// Open database at a specific path (useful for testing)
    pub fn open_path(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Unavailable("database lock poisoned".to_string()))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<(), PersistenceError> {
        let current_version = self.schema_version()?;
        if current_version > CURRENT_SCHEMA_VERSION {
            return Err(PersistenceError::Unavailable(format!(
                "Database schema version {} is newer than supported version {}",
                current_version, CURRENT_SCHEMA_VERSION
            )));
        }

        if current_version < 1 {
            self.migrate_to_v1()?;
            self.set_schema_version(1)?;
        }

        Ok(())
    }

    /// Current schema version tracked in PRAGMA user_version.
    pub fn schema_version(&self) -> Result<i64, PersistenceError> {
        Ok(self
            .conn()?
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?)
    }

    fn set_schema_version(&self, version: i64) -> Result<(), PersistenceError> {
        self.conn()?
            .execute_batch(&format!("PRAGMA user_version = {}", version))?;
        Ok(())
    }

    fn migrate_to_v1(&self) -> Result<(), PersistenceError> {
        self.conn()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                table_name TEXT NOT NULL,
                contact_id TEXT NOT NULL,
                sort_key TEXT NOT NULL DEFAULT '',
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (table_name, contact_id, sort_key)
            );

            CREATE INDEX IF NOT EXISTS idx_items_updated_at
                ON items(table_name, updated_at DESC);
            "#,
        )?;

        Ok(())
    }

    /// Insert or replace an item (last writer wins)
    pub fn put_item(&self, table: &str, item: &Value) -> Result<(), PersistenceError> {
        let (contact_id, sort_key) = item_key(item)?;
        let payload = serde_json::to_string(item)?;

        self.conn()?.execute(
            r#"
            INSERT INTO items (table_name, contact_id, sort_key, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (table_name, contact_id, sort_key)
            DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
            "#,
            params![table, contact_id, sort_key, payload, Utc::now().timestamp()],
        )?;

        Ok(())
    }

    /// Get an item by its full key
    pub fn get_item(
        &self,
        table: &str,
        contact_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<Value>, PersistenceError> {
        let payload: Option<String> = self
            .conn()?
            .query_row(
                "SELECT payload FROM items WHERE table_name = ?1 AND contact_id = ?2 AND sort_key = ?3",
                params![table, contact_id, timestamp.unwrap_or("")],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    /// All items for a partition key, ordered by sort key
    pub fn query_items(&self, table: &str, contact_id: &str) -> Result<Vec<Value>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT payload FROM items
             WHERE table_name = ?1 AND contact_id = ?2
             ORDER BY sort_key ASC",
        )?;

        let payloads = stmt
            .query_map(params![table, contact_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = payloads
            .iter()
            .map(|p| serde_json::from_str(p))
            .collect::<serde_json::Result<Vec<Value>>>()?;

        Ok(items)
    }

    /// Most recently written items in a table
    pub fn list_recent(&self, table: &str, limit: usize) -> Result<Vec<Value>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT payload FROM items
             WHERE table_name = ?1
             ORDER BY updated_at DESC, contact_id ASC
             LIMIT ?2",
        )?;

        let payloads = stmt
            .query_map(params![table, limit as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = payloads
            .iter()
            .map(|p| serde_json::from_str(p))
            .collect::<serde_json::Result<Vec<Value>>>()?;

        Ok(items)
    }

    /// Number of items in a table
    pub fn count_items(&self, table: &str) -> Result<usize, PersistenceError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM items WHERE table_name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl SummaryStore for Database {
    async fn put(&self, table: &str, item: &Value) -> Result<(), PersistenceError> {
        self.put_item(table, item)
    }

    async fn get(
        &self,
        table: &str,
        contact_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<Value>, PersistenceError> {
        self.get_item(table, contact_id, timestamp)
    }

    async fn query(&self, table: &str, contact_id: &str) -> Result<Vec<Value>, PersistenceError> {
        self.query_items(table, contact_id)
    }
}
