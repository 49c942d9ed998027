//! Call summarization pipeline orchestration

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::llm::{build_summarization_prompt, GenerateRequest, GenerationParams, InferenceClient};
use crate::storage::{CallSummaryRecord, Database, PersistenceError, SummaryStore};
use crate::summarize::event::{SummarizeOutcome, TriggerEvent};
use crate::summarize::extractor::extract;
use crate::transcript::{LocalObjectStore, TranscriptSource};
use crate::{Result, SummarizeError};

/// Last step a pipeline run completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    TranscriptFetched,
    PromptBuilt,
    Inferred,
    Extracted,
    Persisted,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::TranscriptFetched => "transcript_fetched",
            Self::PromptBuilt => "prompt_built",
            Self::Inferred => "inferred",
            Self::Extracted => "extracted",
            Self::Persisted => "persisted",
            Self::Done => "done",
        }
    }
}

/// Turns a transcription-completed event into a persisted call summary.
///
/// One event per call, steps strictly in order, no retries. Collaborators
/// are injected so each can be replaced independently.
pub struct SummarizationPipeline {
    transcripts: Arc<dyn TranscriptSource>,
    inference: Arc<dyn InferenceClient>,
    store: Arc<dyn SummaryStore>,
    table: String,
    params: GenerationParams,
}

impl SummarizationPipeline {
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        inference: Arc<dyn InferenceClient>,
        store: Arc<dyn SummaryStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            transcripts,
            inference,
            store,
            table: table.into(),
            params: GenerationParams::default(),
        }
    }

    /// Override the generation parameters (defaults: 4096 tokens, temperature 0.7)
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Build a pipeline wired to the configured collaborators
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let transcripts = LocalObjectStore::from_settings(settings);
        let inference = crate::llm::build_provider(settings)?;
        let store = Database::open(settings)?;

        Ok(Self::new(
            Arc::new(transcripts),
            Arc::from(inference),
            Arc::new(store),
            settings.storage.summaries_table.clone(),
        )
        .with_params(GenerationParams::from_settings(settings)))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Process one event end to end.
    ///
    /// Failures are logged with the event and the stage reached, then
    /// returned unchanged.
    pub async fn handle(&self, event: &TriggerEvent) -> Result<SummarizeOutcome> {
        info!(event = ?event, "Processing call summarization event");

        let mut stage = Stage::Received;
        match self.run(event, &mut stage).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log_failure(event, stage, &e);
                Err(e)
            }
        }
    }

    async fn run(&self, event: &TriggerEvent, stage: &mut Stage) -> Result<SummarizeOutcome> {
        let event = event.validate()?;
        *stage = Stage::Validated;
        let contact_id = event.contact_id.as_str();

        info!(contact_id, locator = %event.transcript_locator, "Fetching transcript");
        let transcript = self
            .transcripts
            .fetch_text(&event.transcript_locator)
            .await
            .map_err(|source| SummarizeError::TranscriptUnavailable {
                locator: event.transcript_locator.clone(),
                source,
            })?;
        *stage = Stage::TranscriptFetched;

        let prompt = build_summarization_prompt(&transcript);
        *stage = Stage::PromptBuilt;
        debug!(contact_id, prompt_len = prompt.len(), "Built summarization prompt");

        info!(contact_id, model = self.inference.model(), "Generating AI summary");
        let raw_summary = self
            .inference
            .complete(GenerateRequest {
                system_prompt: None,
                prompt: &prompt,
                params: self.params,
            })
            .await?;
        *stage = Stage::Inferred;

        let summary = extract(&raw_summary)?;
        *stage = Stage::Extracted;

        let record = CallSummaryRecord::completed(
            event.contact_id.clone(),
            event.occurred_at.clone(),
            summary,
            transcript,
        );
        let item = serde_json::to_value(&record).map_err(PersistenceError::from)?;

        info!(contact_id, table = %self.table, "Saving summary");
        self.store.put(&self.table, &item).await?;
        *stage = Stage::Persisted;

        info!(contact_id, "Call summarization completed successfully");
        *stage = Stage::Done;

        Ok(SummarizeOutcome::success(event.contact_id))
    }
}

/// Log a failed run with the event, the stage reached and the cause chain.
pub(crate) fn log_failure(event: &TriggerEvent, stage: Stage, err: &SummarizeError) {
    let cause = error_chain(err);
    match err {
        SummarizeError::MalformedResponse(e) => error!(
            event = ?event,
            stage = stage.as_str(),
            kind = err.kind(),
            error = %cause,
            raw_response = %e.raw(),
            "Error processing call summarization"
        ),
        _ => error!(
            event = ?event,
            stage = stage.as_str(),
            kind = err.kind(),
            retryable = err.is_retryable(),
            error = %cause,
            "Error processing call summarization"
        ),
    }
}

/// Render an error and all of its sources as one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
