// Record encoding between tasks and the opaque values a provider stores

use crate::models::Task;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

/// Core trait for anything the store keeps in a provider collection
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Identifier of the user this record belongs to
    fn owner(&self) -> &str;

    /// Collection name under which the provider keeps these records
    fn collection_name() -> &'static str
    where
        Self: Sized;
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn collection_name() -> &'static str {
        "tasks"
    }
}

/// One entry of the backing collection
///
/// Entries that fail to decode are kept as `Raw` and written back unchanged,
/// so a schema mismatch never destroys data on the next write.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored<T> {
    Decoded(T),
    Raw(Value),
}

impl<T: Record> Stored<T> {
    pub fn decode(value: Value) -> Self {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => Stored::Decoded(record),
            Err(e) => {
                let id = value.get("id").and_then(Value::as_str).unwrap_or("<missing>");
                warn!(
                    collection = T::collection_name(),
                    id,
                    error = %e,
                    "Failed to decode record, keeping it verbatim"
                );
                Stored::Raw(value)
            }
        }
    }

    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        match self {
            Stored::Decoded(record) => serde_json::to_value(record),
            Stored::Raw(value) => Ok(value.clone()),
        }
    }

    pub fn as_decoded(&self) -> Option<&T> {
        match self {
            Stored::Decoded(record) => Some(record),
            Stored::Raw(_) => None,
        }
    }

    pub fn as_decoded_mut(&mut self) -> Option<&mut T> {
        match self {
            Stored::Decoded(record) => Some(record),
            Stored::Raw(_) => None,
        }
    }

    /// Id of the entry, including undecodable entries that carry a string `id`
    pub fn id(&self) -> Option<&str> {
        match self {
            Stored::Decoded(record) => Some(record.id()),
            Stored::Raw(value) => value.get("id").and_then(Value::as_str),
        }
    }
}
