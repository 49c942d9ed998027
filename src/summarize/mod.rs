//! Summarization module for calldigest
//!
//! Event validation, response extraction and the pipeline that ties the
//! transcript source, inference client and store together.

mod event;
mod extractor;
mod pipeline;

pub use event::{EventDetail, SummarizeOutcome, TriggerEvent, ValidatedEvent};
pub use extractor::{
    extract, select_payload, ExtractionMethod, MalformedResponseError, REQUIRED_FIELDS,
};
pub use pipeline::{Stage, SummarizationPipeline};
pub(crate) use pipeline::log_failure;
