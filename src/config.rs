// Configuration: where the store lives, which backend, which user

use crate::jsonl::JsonlProvider;
use crate::provider::PersistenceProvider;
use crate::sqlite::SqliteProvider;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "tasktrack";
const CONFIG_FILE: &str = "config.yaml";
const SQLITE_FILE: &str = "tasktrack.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Jsonl,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store files
    pub store_path: PathBuf,
    pub backend: Backend,
    /// Signed-in user; no user means an anonymous session
    pub user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let store_path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        let user = env::var("USER").or_else(|_| env::var("USERNAME")).ok();

        Self {
            store_path,
            backend: Backend::default(),
            user,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/tasktrack/config.yaml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path, else the default path
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config")
    }

    fn read(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Open the configured persistence provider
    pub fn open_provider(&self) -> Result<Box<dyn PersistenceProvider>> {
        match self.backend {
            Backend::Jsonl => {
                let provider = JsonlProvider::open(&self.store_path)
                    .with_context(|| format!("Failed to open store at {}", self.store_path.display()))?;
                Ok(Box::new(provider))
            }
            Backend::Sqlite => {
                let db_path = self.store_path.join(SQLITE_FILE);
                let provider = SqliteProvider::open(&db_path)
                    .with_context(|| format!("Failed to open database {}", db_path.display()))?;
                Ok(Box::new(provider))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_from_yaml_full() {
        let config = Config::from_yaml("store_path: /tmp/tasks\nbackend: sqlite\nuser: alice\n").unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/tasks"));
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_from_yaml_partial_uses_defaults() {
        let config = Config::from_yaml("user: bob\n").unwrap();
        assert_eq!(config.backend, Backend::Jsonl);
        assert_eq!(config.store_path, Config::default().store_path);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_backend() {
        assert!(Config::from_yaml("backend: postgres\n").is_err());
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("missing.yaml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: jsonl\nuser: carol\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.user.as_deref(), Some("carol"));
    }

    #[test]
    fn test_open_provider_for_each_backend() {
        let temp = TempDir::new().unwrap();

        for backend in [Backend::Jsonl, Backend::Sqlite] {
            let config = Config {
                store_path: temp.path().join(format!("{:?}", backend)),
                backend,
                user: None,
            };
            let mut provider = config.open_provider().unwrap();
            provider.write_all("tasks", &[json!({"id": "1"})]).unwrap();
            assert_eq!(provider.read_all("tasks").unwrap(), vec![json!({"id": "1"})]);
        }
        assert!(temp.path().join("Sqlite").join(SQLITE_FILE).exists());
        assert!(temp.path().join("Jsonl").join("tasks.jsonl").exists());
    }
}
