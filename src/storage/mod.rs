//! Storage module for calldigest
//!
//! The call summary data model and the keyed store it is persisted to.

mod database;
mod models;
mod repository;
mod store;

pub use database::Database;
pub use models::{display_value, CallSummaryRecord, RecordStatus, Sentiment, StructuredSummary};
pub use repository::SummaryRepository;
pub use store::{PersistenceError, SummaryStore};
