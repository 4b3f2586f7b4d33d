// SQLite provider: one row per record, whole-collection replace per write

use crate::provider::{PersistenceProvider, ProviderError, validate_collection_name};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub struct SqliteProvider {
    db: Connection,
}

impl SqliteProvider {
    /// Open or create a database file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let db = Connection::open(path)?;
        let provider = Self { db };
        provider.create_schema()?;
        Ok(provider)
    }

    pub fn open_in_memory() -> Result<Self, ProviderError> {
        let provider = Self {
            db: Connection::open_in_memory()?,
        };
        provider.create_schema()?;
        Ok(provider)
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }

    /// Number of records and write time (ms since epoch) of the last write
    pub fn collection_info(&self, collection: &str) -> Result<Option<(usize, i64)>, ProviderError> {
        let info = self
            .db
            .query_row(
                "SELECT record_count, written_at FROM collections WHERE collection = ?1",
                [collection],
                |row| {
                    let count: i64 = row.get(0)?;
                    let count =
                        usize::try_from(count).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count))?;
                    Ok((count, row.get::<_, i64>(1)?))
                },
            )
            .optional()?;
        Ok(info)
    }

    fn create_schema(&self) -> Result<(), ProviderError> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            -- One row per record, in collection order
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                position INTEGER NOT NULL,
                id TEXT,
                data_json TEXT NOT NULL,
                PRIMARY KEY (collection, position)
            );

            CREATE INDEX IF NOT EXISTS idx_records_id ON records(collection, id);

            -- Write metadata; presence distinguishes "empty" from "never written"
            CREATE TABLE IF NOT EXISTS collections (
                collection TEXT PRIMARY KEY,
                record_count INTEGER NOT NULL,
                written_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl PersistenceProvider for SqliteProvider {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, ProviderError> {
        validate_collection_name(collection)?;

        let mut stmt = self
            .db
            .prepare("SELECT data_json FROM records WHERE collection = ?1 ORDER BY position")?;
        let rows = stmt.query_map([collection], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row_result in rows {
            let data_json = row_result?;
            records.push(serde_json::from_str(&data_json)?);
        }

        info!(collection, count = records.len(), "Loaded records from SQLite");
        Ok(records)
    }

    fn write_all(&mut self, collection: &str, records: &[Value]) -> Result<(), ProviderError> {
        validate_collection_name(collection)?;

        let tx = self.db.transaction()?;

        tx.execute("DELETE FROM records WHERE collection = ?1", [collection])?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO records (collection, position, id, data_json)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, record) in records.iter().enumerate() {
                let id = record.get("id").and_then(Value::as_str);
                let data_json = serde_json::to_string(record)?;
                insert.execute(rusqlite::params![collection, position as i64, id, data_json])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO collections (collection, record_count, written_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![collection, records.len() as i64, Utc::now().timestamp_millis()],
        )?;

        tx.commit()?;

        debug!(collection, count = records.len(), "Replaced SQLite collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("data/tasktrack.db");

        let _provider = SqliteProvider::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_read_never_written_collection() {
        let provider = SqliteProvider::open_in_memory().unwrap();
        assert!(provider.read_all("tasks").unwrap().is_empty());
        assert!(provider.collection_info("tasks").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let mut provider = SqliteProvider::open_in_memory().unwrap();

        let records = vec![
            json!({"id": "z", "title": "Last alphabetically"}),
            json!({"id": "a", "title": "First alphabetically"}),
            json!({"no_id": true}),
        ];
        provider.write_all("tasks", &records).unwrap();

        assert_eq!(provider.read_all("tasks").unwrap(), records);
        let (count, written_at) = provider.collection_info("tasks").unwrap().unwrap();
        assert_eq!(count, 3);
        assert!(written_at > 0);
    }

    #[test]
    fn test_collection_info_rejects_negative_count() {
        let provider = SqliteProvider::open_in_memory().unwrap();
        provider
            .db()
            .execute(
                "INSERT INTO collections (collection, record_count, written_at) VALUES ('tasks', -1, 0)",
                [],
            )
            .unwrap();

        let err = provider.collection_info("tasks").unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Sqlite(rusqlite::Error::IntegralValueOutOfRange(0, -1))
        ));
    }

    #[test]
    fn test_write_replaces_only_its_collection() {
        let mut provider = SqliteProvider::open_in_memory().unwrap();

        provider.write_all("tasks", &[json!({"id": "1"}), json!({"id": "2"})]).unwrap();
        provider.write_all("archive", &[json!({"id": "old"})]).unwrap();
        provider.write_all("tasks", &[json!({"id": "3"})]).unwrap();

        assert_eq!(provider.read_all("tasks").unwrap(), vec![json!({"id": "3"})]);
        assert_eq!(provider.read_all("archive").unwrap(), vec![json!({"id": "old"})]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("tasktrack.db");

        {
            let mut provider = SqliteProvider::open(&db_path).unwrap();
            provider.write_all("tasks", &[json!({"id": "keep"})]).unwrap();
        }

        let provider = SqliteProvider::open(&db_path).unwrap();
        assert_eq!(provider.read_all("tasks").unwrap(), vec![json!({"id": "keep"})]);
    }
}
