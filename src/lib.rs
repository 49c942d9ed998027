//! calldigest - Structured knowledge extraction from call-center transcripts
//!
//! A completed transcription goes in, a validated call summary record
//! (issue, resolution, sentiment, category, next steps) comes out and is
//! persisted keyed by the call's contact id.

pub mod cli;
pub mod config;
pub mod llm;
pub mod storage;
pub mod summarize;
pub mod transcript;

use thiserror::Error;

pub use llm::InferenceError;
pub use storage::PersistenceError;
pub use summarize::MalformedResponseError;
pub use transcript::FetchError;

/// Failure taxonomy of the summarization pipeline.
///
/// Each variant keeps the collaborator's own error as its source so the
/// full cause chain survives up to the hosting layer.
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Transcript unavailable at {locator}")]
    TranscriptUnavailable {
        locator: String,
        #[source]
        source: FetchError,
    },

    #[error("Inference failed")]
    Inference(#[from] InferenceError),

    #[error("Malformed model response")]
    MalformedResponse(#[from] MalformedResponseError),

    #[error("Failed to persist summary")]
    Persistence(#[from] PersistenceError),
}

impl SummarizeError {
    /// Whether redelivering the same event could succeed.
    ///
    /// Only a malformed event is fatal; every other failure depends on a
    /// remote collaborator and may clear up on a later attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidEvent(_))
    }

    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEvent(_) => "invalid_event",
            Self::TranscriptUnavailable { .. } => "transcript_unavailable",
            Self::Inference(_) => "inference",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Persistence(_) => "persistence",
        }
    }
}

pub type Result<T> = std::result::Result<T, SummarizeError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "calldigest";
