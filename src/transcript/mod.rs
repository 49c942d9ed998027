//! Transcript source boundary
//!
//! Fetches the raw text of a completed transcription given a
//! `scheme://bucket/key` locator.

mod local;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalObjectStore;

/// Failure to retrieve transcript text.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid transcript locator: {0}")]
    InvalidLocator(String),

    #[error("Transcript not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcript is not valid UTF-8")]
    Decode(#[from] std::string::FromUtf8Error),
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Return the full transcript text addressed by `locator`.
    async fn fetch_text(&self, locator: &str) -> Result<String, FetchError>;
}

/// A locator split into its bucket and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
}

/// Parse `scheme://bucket/key`.
///
/// The scheme is optional and ignored; the bucket ends at the first `/`.
pub fn parse_locator(locator: &str) -> Result<ObjectLocation<'_>, FetchError> {
    let trimmed = locator.trim();
    let rest = match trimmed.split_once("://") {
        Some((_, rest)) => rest,
        None => trimmed,
    };

    let (bucket, key) = rest
        .split_once('/')
        .ok_or_else(|| FetchError::InvalidLocator(locator.to_string()))?;

    if bucket.is_empty() || key.is_empty() {
        return Err(FetchError::InvalidLocator(locator.to_string()));
    }

    Ok(ObjectLocation { bucket, key })
}
