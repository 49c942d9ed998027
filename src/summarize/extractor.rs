//! Structured summary extraction from raw model output
//!
//! Models often wrap the requested JSON object in markdown code fences.
//! The payload is selected by three rules tried in a fixed order:
//! 1. body of the first ```` ```json ```` fence
//! 2. body of the first plain ```` ``` ```` fence
//! 3. the whole response
//!
//! The selected text is parsed as a JSON object and checked for the
//! required keys. Values are kept exactly as parsed, whatever their type.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::storage::StructuredSummary;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Keys that must be present in every summary.
pub const REQUIRED_FIELDS: [&str; 4] = ["issue", "resolution", "sentiment", "category"];

const NEXT_STEPS_FIELD: &str = "nextSteps";

/// Model output that could not be turned into a summary.
///
/// Every variant keeps the raw response for diagnostics.
#[derive(Error, Debug)]
pub enum MalformedResponseError {
    #[error("Invalid JSON in model response: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("Model response is not a JSON object")]
    NotAnObject { raw: String },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str, raw: String },
}

impl MalformedResponseError {
    /// The unmodified model response
    pub fn raw(&self) -> &str {
        match self {
            Self::InvalidJson { raw, .. }
            | Self::NotAnObject { raw }
            | Self::MissingField { raw, .. } => raw,
        }
    }
}

/// Which rule selected the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Body of a ```json fence
    JsonFence,
    /// Body of an untagged ``` fence
    PlainFence,
    /// Entire response, trimmed
    Bare,
}

impl ExtractionMethod {
    /// Rules in priority order
    pub const PRIORITY: [ExtractionMethod; 3] = [Self::JsonFence, Self::PlainFence, Self::Bare];

    /// Apply this rule, returning the untrimmed payload if it matches.
    fn select(self, raw: &str) -> Option<&str> {
        match self {
            Self::JsonFence => fence_body(raw, JSON_FENCE),
            Self::PlainFence => fence_body(raw, FENCE),
            Self::Bare => Some(raw),
        }
    }
}

/// Text between the first `opener` and the next closing fence.
///
/// An unclosed fence runs to the end of the response.
fn fence_body<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let start = raw.find(opener)? + opener.len();
    let rest = &raw[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Select the structured payload out of a raw response.
pub fn select_payload(raw: &str) -> (ExtractionMethod, &str) {
    ExtractionMethod::PRIORITY
        .iter()
        .find_map(|method| method.select(raw).map(|body| (*method, body.trim())))
        .unwrap_or((ExtractionMethod::Bare, raw.trim()))
}

/// Parse and validate a raw model response.
pub fn extract(raw: &str) -> Result<StructuredSummary, MalformedResponseError> {
    let (method, payload) = select_payload(raw);
    debug!(?method, payload_len = payload.len(), "Selected summary payload");

    let value: Value =
        serde_json::from_str(payload).map_err(|source| MalformedResponseError::InvalidJson {
            source,
            raw: raw.to_string(),
        })?;

    let Value::Object(mut fields) = value else {
        return Err(MalformedResponseError::NotAnObject {
            raw: raw.to_string(),
        });
    };

    if let Some(field) = REQUIRED_FIELDS
        .iter()
        .copied()
        .find(|f| !fields.contains_key(*f))
    {
        return Err(MalformedResponseError::MissingField {
            field,
            raw: raw.to_string(),
        });
    }

    let mut take = |key: &str| fields.remove(key).unwrap_or(Value::Null);
    let issue = take("issue");
    let resolution = take("resolution");
    let sentiment = take("sentiment");
    let category = take("category");

    let next_steps = fields.remove(NEXT_STEPS_FIELD).filter(|v| !v.is_null());

    Ok(StructuredSummary {
        issue,
        resolution,
        sentiment,
        category,
        next_steps,
        extra: fields,
    })
}
