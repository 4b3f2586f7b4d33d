// Typed failures reported by the task store

use crate::provider::ProviderError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] ProviderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("task title cannot be empty")]
    EmptyTitle,

    #[error("you must be signed in to create tasks")]
    Unauthenticated,
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Persistence(ProviderError::Json(value))
    }
}
