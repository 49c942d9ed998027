//! Persistence store boundary

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure writing to or reading from the persistence store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to serialize item: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable keyed storage for free-form items.
///
/// Items are addressed by their `contactId` attribute (partition key) and
/// `timestamp` attribute (sort key). Writing an existing key replaces it.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn put(&self, table: &str, item: &Value) -> Result<(), PersistenceError>;

    async fn get(
        &self,
        table: &str,
        contact_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<Value>, PersistenceError>;

    /// All items under one partition key, ordered by sort key.
    async fn query(&self, table: &str, contact_id: &str) -> Result<Vec<Value>, PersistenceError>;
}

/// Extract `(partition key, sort key)` from an item.
///
/// A missing or null `timestamp` maps to the empty sort key.
pub(crate) fn item_key(item: &Value) -> Result<(&str, &str), PersistenceError> {
    let contact_id = item
        .get("contactId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PersistenceError::InvalidItem("missing string contactId".to_string()))?;

    let sort_key = match item.get("timestamp") {
        None | Some(Value::Null) => "",
        Some(Value::String(ts)) => ts.as_str(),
        Some(other) => {
            return Err(PersistenceError::InvalidItem(format!(
                "timestamp must be a string, got {}",
                other
            )))
        }
    };

    Ok((contact_id, sort_key))
}
