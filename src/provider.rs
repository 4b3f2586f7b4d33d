// Persistence contract consumed by the task store

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt collection {}: line {line}: {message}", .path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },
}

/// Durable storage for flat lists of records keyed by collection name
///
/// Records are opaque to the provider. `write_all` replaces the whole
/// collection; `read_all` returns an empty list for a collection that was
/// never written.
pub trait PersistenceProvider {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, ProviderError>;

    fn write_all(&mut self, collection: &str, records: &[Value]) -> Result<(), ProviderError>;
}

impl<P: PersistenceProvider + ?Sized> PersistenceProvider for &mut P {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, ProviderError> {
        (**self).read_all(collection)
    }

    fn write_all(&mut self, collection: &str, records: &[Value]) -> Result<(), ProviderError> {
        (**self).write_all(collection, records)
    }
}

impl<P: PersistenceProvider + ?Sized> PersistenceProvider for Box<P> {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, ProviderError> {
        (**self).read_all(collection)
    }

    fn write_all(&mut self, collection: &str, records: &[Value]) -> Result<(), ProviderError> {
        (**self).write_all(collection, records)
    }
}

/// Collection names end up in file names and SQL parameters
pub fn validate_collection_name(name: &str) -> Result<(), ProviderError> {
    if name.is_empty() {
        return Err(ProviderError::InvalidCollection("collection name cannot be empty".to_string()));
    }
    if name.len() > 64 {
        return Err(ProviderError::InvalidCollection(format!(
            "{} (max 64 chars)",
            name
        )));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ProviderError::InvalidCollection(format!(
            "{} (must be alphanumeric with _/-)",
            name
        )));
    }
    Ok(())
}

/// In-process key/value storage holding each collection as one serialized
/// JSON array, like a browser storage area
///
/// An optional quota caps the serialized size of any single collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(limit),
        }
    }

    pub fn set_quota(&mut self, limit: Option<usize>) {
        self.quota = limit;
    }

    /// Serialized contents of a collection, if it was ever written
    pub fn raw(&self, collection: &str) -> Option<&str> {
        self.entries.get(collection).map(String::as_str)
    }
}

impl PersistenceProvider for MemoryProvider {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, ProviderError> {
        validate_collection_name(collection)?;

        match self.entries.get(collection) {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&mut self, collection: &str, records: &[Value]) -> Result<(), ProviderError> {
        validate_collection_name(collection)?;

        let json = serde_json::to_string(records)?;
        if let Some(limit) = self.quota {
            if json.len() > limit {
                return Err(ProviderError::QuotaExceeded {
                    needed: json.len(),
                    limit,
                });
            }
        }

        debug!(collection, count = records.len(), bytes = json.len(), "Replacing in-memory collection");
        self.entries.insert(collection.to_string(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_read_missing_collection_is_empty() {
        let provider = MemoryProvider::new();
        assert!(provider.read_all("tasks").unwrap().is_empty());
    }

    #[test]
    fn test_memory_write_replaces_collection() {
        let mut provider = MemoryProvider::new();
        provider
            .write_all("tasks", &[json!({"id": "1"}), json!({"id": "2"})])
            .unwrap();
        provider.write_all("tasks", &[json!({"id": "3"})]).unwrap();

        assert_eq!(provider.read_all("tasks").unwrap(), vec![json!({"id": "3"})]);
        assert_eq!(provider.raw("tasks"), Some(r#"[{"id":"3"}]"#));
    }

    #[test]
    fn test_memory_quota_rejects_oversized_write() {
        let mut provider = MemoryProvider::with_quota(16);
        provider.write_all("tasks", &[json!({"id": "1"})]).unwrap();

        let err = provider
            .write_all("tasks", &[json!({"id": "1", "title": "far too long for the quota"})])
            .unwrap_err();
        assert!(matches!(err, ProviderError::QuotaExceeded { limit: 16, .. }));

        // Previous contents survive the failed write
        assert_eq!(provider.read_all("tasks").unwrap(), vec![json!({"id": "1"})]);
    }

    #[test]
    fn test_memory_read_validates_collection_name() {
        let provider = MemoryProvider::new();
        let err = provider.read_all("../tasks").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCollection(_)));
    }

    #[test]
    fn test_validation_collection_name() {
        // Valid
        assert!(validate_collection_name("tasks").is_ok());
        assert!(validate_collection_name("archived-tasks_2").is_ok());

        // Invalid
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("../tasks").is_err());
        assert!(validate_collection_name(&"a".repeat(65)).is_err());
    }
}
