//! Trigger event and success payload

use serde::{Deserialize, Serialize};

use crate::SummarizeError;

/// Transcription-completed event that starts the pipeline.
///
/// Only the fields the pipeline reads are modelled; any other envelope
/// fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(default)]
    pub detail: EventDetail,

    /// Event time (ISO-8601), passed through to the record
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(default)]
    pub contact_id: Option<String>,

    #[serde(default)]
    pub transcript_file_uri: Option<String>,
}

/// An event whose required fields are known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvent {
    pub contact_id: String,
    pub transcript_locator: String,
    pub occurred_at: Option<String>,
}

impl TriggerEvent {
    pub fn new(
        contact_id: impl Into<String>,
        transcript_file_uri: impl Into<String>,
        time: Option<String>,
    ) -> Self {
        Self {
            detail: EventDetail {
                contact_id: Some(contact_id.into()),
                transcript_file_uri: Some(transcript_file_uri.into()),
            },
            time,
        }
    }

    /// Decode an event from JSON. Undecodable input is an invalid event.
    pub fn from_json(input: &str) -> Result<Self, SummarizeError> {
        serde_json::from_str(input)
            .map_err(|e| SummarizeError::InvalidEvent(format!("Event is not valid JSON: {}", e)))
    }

    /// Check that `contactId` and `transcriptFileUri` are present and non-empty.
    pub fn validate(&self) -> Result<ValidatedEvent, SummarizeError> {
        let contact_id = required(self.detail.contact_id.as_deref(), "contactId")?;
        let transcript_locator =
            required(self.detail.transcript_file_uri.as_deref(), "transcriptFileUri")?;

        Ok(ValidatedEvent {
            contact_id: contact_id.to_string(),
            transcript_locator: transcript_locator.to_string(),
            occurred_at: self.time.clone(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, SummarizeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SummarizeError::InvalidEvent(format!(
            "Missing required field: detail.{}",
            name
        ))),
    }
}

/// Result reported for a fully processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeOutcome {
    pub contact_id: String,
    pub status: String,
}

impl SummarizeOutcome {
    pub fn success(contact_id: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            status: "success".to_string(),
        }
    }
}
