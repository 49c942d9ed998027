//! Data models for storage

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Processing state of a call summary record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    /// Waiting to be summarized (written by other producers)
    Pending,
    /// Summarization in progress (written by other producers)
    Processing,
    /// Summary extracted and stored
    Completed,
    /// Summarization failed (written by other producers)
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Customer sentiment as the prompt asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Case-insensitive match against the three documented values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Validated extraction result.
///
/// Only the presence of the four required fields is checked. Values keep
/// whatever JSON type the model produced; keys beyond the documented ones
/// are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSummary {
    /// Main issue or reason for the call
    pub issue: Value,

    /// How the issue was resolved or handled
    pub resolution: Value,

    /// positive, neutral or negative (not enforced)
    pub sentiment: Value,

    /// Free-form call category
    pub category: Value,

    /// Follow-up actions, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Value>,

    /// Additional keys the model returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredSummary {
    /// Sentiment if it is one of the documented values
    pub fn sentiment_kind(&self) -> Option<Sentiment> {
        self.sentiment.as_str().and_then(Sentiment::from_str)
    }
}

/// Render a summary value for display.
///
/// Strings print bare, lists print one item after another separated by
/// `; `, anything else prints as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// The persisted call summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSummaryRecord {
    /// Partition key
    pub contact_id: String,

    /// Event time, passed through untouched from the trigger
    pub timestamp: Option<String>,

    /// Extracted summary
    pub summary: StructuredSummary,

    /// Full transcript text, kept for audit
    pub transcript: String,

    pub status: RecordStatus,
}

impl CallSummaryRecord {
    /// Assemble the record for a successful pipeline run
    pub fn completed(
        contact_id: String,
        timestamp: Option<String>,
        summary: StructuredSummary,
        transcript: String,
    ) -> Self {
        Self {
            contact_id,
            timestamp,
            summary,
            transcript,
            status: RecordStatus::Completed,
        }
    }
}
