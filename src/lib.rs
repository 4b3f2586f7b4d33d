// tasktrack - Personal task tracker with per-user views over a shared store

pub mod config;
pub mod demo;
pub mod error;
pub mod filter;
pub mod identity;
pub mod jsonl;
pub mod models;
pub mod provider;
pub mod record;
pub mod sqlite;
pub mod store;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::{StoreError, StoreResult, ValidationError};
pub use filter::{StatusFilter, TaskQuery};
pub use identity::{IdentityProvider, Session};
pub use jsonl::JsonlProvider;
pub use models::{Category, Priority, Task, TaskCounts, TaskDraft, TaskPatch};
pub use provider::{MemoryProvider, PersistenceProvider, ProviderError};
pub use record::Record;
pub use sqlite::SqliteProvider;
pub use store::TaskStore;
