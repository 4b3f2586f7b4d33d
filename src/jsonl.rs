// JSONL file provider: one `{collection}.jsonl` file per collection

use crate::provider::{PersistenceProvider, ProviderError, validate_collection_name};
use fs2::FileExt;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stores each collection as newline-delimited JSON
///
/// Writes go to a temp file that is renamed over the collection file while
/// an exclusive lock is held on `{collection}.lock`, so readers see either
/// the old or the new collection, never a partial one.
#[derive(Debug, Clone)]
pub struct JsonlProvider {
    base_path: PathBuf,
}

impl JsonlProvider {
    /// Open or create a provider rooted at the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", collection))
    }

    fn corrupt(path: &Path, line_num: usize, error: impl std::fmt::Display) -> ProviderError {
        warn!(file = ?path, line = line_num + 1, error = %error, "Unreadable JSONL line");
        ProviderError::Corrupt {
            path: path.to_path_buf(),
            line: line_num + 1,
            message: error.to_string(),
        }
    }

    fn lock_file(&self, collection: &str) -> Result<File, ProviderError> {
        let lock_path = self.base_path.join(format!("{}.lock", collection));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;
        Ok(file)
    }
}

impl PersistenceProvider for JsonlProvider {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, ProviderError> {
        validate_collection_name(collection)?;

        let path = self.collection_path(collection);
        if !path.exists() {
            // First run: nothing written yet
            return Ok(Vec::new());
        }

        let lock = self.lock_file(collection)?;
        lock.lock_shared()?;

        let reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();

        // A skipped line would be dropped by the next whole-file write, so any
        // unreadable line fails the whole read
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Self::corrupt(&path, line_num, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let record = serde_json::from_str::<Value>(&line).map_err(|e| Self::corrupt(&path, line_num, e))?;
            records.push(record);
        }

        lock.unlock()?;

        info!(file = ?path, count = records.len(), "Loaded records from JSONL");
        Ok(records)
    }

    fn write_all(&mut self, collection: &str, records: &[Value]) -> Result<(), ProviderError> {
        validate_collection_name(collection)?;

        let path = self.collection_path(collection);
        let tmp_path = self.base_path.join(format!("{}.jsonl.tmp", collection));

        let lock = self.lock_file(collection)?;
        lock.lock_exclusive()?;

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &path)?;
        lock.unlock()?;

        debug!(file = ?path, count = records.len(), "Replaced JSONL collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::identity::Session;
    use crate::store::TaskStore;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let provider = JsonlProvider::open(temp.path().join("nested/store")).unwrap();
        assert!(provider.base_path().is_dir());
    }

    #[test]
    fn test_read_nonexistent_collection() {
        let temp = TempDir::new().unwrap();
        let provider = JsonlProvider::open(temp.path()).unwrap();

        let records = provider.read_all("tasks").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let temp = TempDir::new().unwrap();
        let mut provider = JsonlProvider::open(temp.path()).unwrap();

        let records = vec![
            json!({"id": "b", "title": "Second"}),
            json!({"id": "a", "title": "First", "dueDate": "2024-05-01"}),
        ];
        provider.write_all("tasks", &records).unwrap();

        assert_eq!(provider.read_all("tasks").unwrap(), records);

        let content = fs::read_to_string(provider.collection_path("tasks")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!temp.path().join("tasks.jsonl.tmp").exists());
    }

    #[test]
    fn test_write_replaces_previous_contents() {
        let temp = TempDir::new().unwrap();
        let mut provider = JsonlProvider::open(temp.path()).unwrap();

        provider
            .write_all("tasks", &[json!({"id": "1"}), json!({"id": "2"})])
            .unwrap();
        provider.write_all("tasks", &[]).unwrap();

        assert!(provider.read_all("tasks").unwrap().is_empty());
    }

    #[test]
    fn test_read_malformed_line() {
        let temp = TempDir::new().unwrap();
        let provider = JsonlProvider::open(temp.path()).unwrap();

        // Valid record, then malformed, then another valid
        fs::write(
            provider.collection_path("tasks"),
            "{\"id\":\"t1\",\"title\":\"Valid\"}\n{malformed json}\n\n{\"id\":\"t2\",\"title\":\"Also Valid\"}\n",
        )
        .unwrap();

        let err = provider.read_all("tasks").unwrap_err();
        match err {
            ProviderError::Corrupt { path, line, .. } => {
                assert_eq!(path, provider.collection_path("tasks"));
                assert_eq!(line, 2);
            }
            other => panic!("expected corrupt collection error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let temp = TempDir::new().unwrap();
        let provider = JsonlProvider::open(temp.path()).unwrap();

        fs::write(provider.collection_path("tasks"), "\n{\"id\":\"t1\"}\n   \n").unwrap();

        assert_eq!(provider.read_all("tasks").unwrap(), vec![json!({"id": "t1"})]);
    }

    #[test]
    fn test_truncated_line_blocks_store_and_survives() {
        let temp = TempDir::new().unwrap();
        let provider = JsonlProvider::open(temp.path()).unwrap();
        let path = provider.collection_path("tasks");

        let truncated = r#"{"id":"bob-1","title":"Bob's task","category":"work","priority":"high","userId":"bob","#;
        fs::write(&path, format!("{}\n", truncated)).unwrap();

        let result = TaskStore::open(provider, Session::authenticated("alice"));
        assert!(matches!(
            result,
            Err(StoreError::Persistence(ProviderError::Corrupt { line: 1, .. }))
        ));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("bob-1"));
    }

    #[test]
    fn test_rejects_path_like_collection() {
        let temp = TempDir::new().unwrap();
        let mut provider = JsonlProvider::open(temp.path()).unwrap();

        let err = provider.write_all("../escape", &[]).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCollection(_)));
    }
}
