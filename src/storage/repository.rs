//! Typed access to persisted call summaries
//!
//! The store holds free-form items, some of which may come from other
//! producers. The repository decodes the ones shaped like call summaries.

use anyhow::Result;
use serde_json::Value;

use crate::config::Settings;
use crate::storage::{CallSummaryRecord, Database};

/// Repository for reading call summary records
pub struct SummaryRepository {
    db: Database,
    table: String,
}

impl SummaryRepository {
    /// Create a repository over the configured summaries table
    pub fn new(settings: &Settings) -> Result<Self> {
        let db = Database::open(settings)?;
        Ok(Self::with_database(db, &settings.storage.summaries_table))
    }

    pub fn with_database(db: Database, table: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
        }
    }

    /// All records for a contact, oldest first
    pub fn records_for_contact(&self, contact_id: &str) -> Result<Vec<CallSummaryRecord>> {
        let items = self.db.query_items(&self.table, contact_id)?;
        Ok(decode_records(items))
    }

    /// Raw items for a contact, as written
    pub fn items_for_contact(&self, contact_id: &str) -> Result<Vec<Value>> {
        Ok(self.db.query_items(&self.table, contact_id)?)
    }

    /// Most recently written records
    pub fn recent(&self, limit: usize) -> Result<Vec<CallSummaryRecord>> {
        let items = self.db.list_recent(&self.table, limit)?;
        Ok(decode_records(items))
    }
}

fn decode_records(items: Vec<Value>) -> Vec<CallSummaryRecord> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping item that is not a call summary: {}", e);
                None
            }
        })
        .collect()
}
