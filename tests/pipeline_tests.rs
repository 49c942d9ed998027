use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::tempdir;

use calldigest::llm::{GenerateRequest, GenerationParams, InferenceClient, InferenceError};
use calldigest::storage::{Database, PersistenceError, SummaryStore};
use calldigest::summarize::{MalformedResponseError, SummarizationPipeline, TriggerEvent};
use calldigest::transcript::{FetchError, TranscriptSource};
use calldigest::SummarizeError;

const TABLE: &str = "call-summaries";
const TRANSCRIPT: &str = "Customer billing issue, resolved by refund.";
const FENCED_RESPONSE: &str = "```json\n{\"issue\":\"Billing dispute\",\"resolution\":\"Refund issued\",\"sentiment\":\"positive\",\"category\":\"billing\"}\n```";

struct FakeTranscripts {
    objects: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeTranscripts {
    fn with(locator: &str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            objects: HashMap::from([(locator.to_string(), text.to_string())]),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch_text(&self, locator: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(locator.to_string()))
    }
}

struct ScriptedModel {
    response: Option<String>,
    prompts: Mutex<Vec<(String, GenerationParams)>>,
}

impl ScriptedModel {
    fn replying(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceClient for ScriptedModel {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: GenerateRequest<'_>) -> Result<String, InferenceError> {
        self.prompts
            .lock()
            .unwrap()
            .push((request.prompt.to_string(), request.params));
        self.response.clone().ok_or(InferenceError::Status {
            status: 429,
            body: "rate limited".to_string(),
        })
    }
}

#[derive(Default)]
struct MemoryStore {
    items: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl MemoryStore {
    fn items(&self) -> Vec<(String, Value)> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn put(&self, table: &str, item: &Value) -> Result<(), PersistenceError> {
        if self.fail {
            return Err(PersistenceError::Unavailable("throttled".to_string()));
        }
        self.items
            .lock()
            .unwrap()
            .push((table.to_string(), item.clone()));
        Ok(())
    }

    async fn get(
        &self,
        _table: &str,
        _contact_id: &str,
        _timestamp: Option<&str>,
    ) -> Result<Option<Value>, PersistenceError> {
        Ok(None)
    }

    async fn query(&self, _table: &str, _contact_id: &str) -> Result<Vec<Value>, PersistenceError> {
        Ok(Vec::new())
    }
}

fn event() -> TriggerEvent {
    TriggerEvent::new(
        "c1",
        "store://bucket/c1.txt",
        Some("2025-11-08T10:00:00Z".to_string()),
    )
}

fn pipeline(
    transcripts: Arc<FakeTranscripts>,
    model: Arc<ScriptedModel>,
    store: Arc<MemoryStore>,
) -> SummarizationPipeline {
    SummarizationPipeline::new(transcripts, model, store, TABLE)
}

#[tokio::test]
async fn fenced_response_is_persisted_as_completed_record() {
    let transcripts = FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT);
    let model = ScriptedModel::replying(FENCED_RESPONSE);
    let store = Arc::new(MemoryStore::default());

    let outcome = pipeline(transcripts, model.clone(), store.clone())
        .handle(&event())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"contactId": "c1", "status": "success"})
    );

    let items = store.items();
    assert_eq!(items.len(), 1);
    let (table, item) = &items[0];
    assert_eq!(table, TABLE);
    assert_eq!(item["status"], "COMPLETED");
    assert_eq!(item["contactId"], "c1");
    assert_eq!(item["timestamp"], "2025-11-08T10:00:00Z");
    assert_eq!(item["summary"]["issue"], "Billing dispute");
    assert_eq!(item["transcript"], TRANSCRIPT);

    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].0.contains(TRANSCRIPT));
    assert_eq!(prompts[0].1, GenerationParams::default());
    assert_eq!(prompts[0].1.max_tokens, 4096);
}

#[tokio::test]
async fn missing_transcript_uri_fails_before_any_call() {
    let transcripts = FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT);
    let model = ScriptedModel::replying(FENCED_RESPONSE);
    let store = Arc::new(MemoryStore::default());

    let mut event = event();
    event.detail.transcript_file_uri = None;

    let err = pipeline(transcripts.clone(), model.clone(), store.clone())
        .handle(&event)
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizeError::InvalidEvent(_)));
    assert!(!err.is_retryable());
    assert_eq!(transcripts.calls.load(Ordering::SeqCst), 0);
    assert_eq!(model.calls(), 0);
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn bare_response_matches_fenced_response() {
    let bare = FENCED_RESPONSE
        .trim_start_matches("```json")
        .trim_end_matches("```");

    let fenced_store = Arc::new(MemoryStore::default());
    pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(FENCED_RESPONSE),
        fenced_store.clone(),
    )
    .handle(&event())
    .await
    .unwrap();

    let bare_store = Arc::new(MemoryStore::default());
    pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(bare),
        bare_store.clone(),
    )
    .handle(&event())
    .await
    .unwrap();

    assert_eq!(fenced_store.items(), bare_store.items());
}

#[tokio::test]
async fn prose_response_fails_without_persisting() {
    let raw = "The customer called about a bill and was happy in the end.";
    let store = Arc::new(MemoryStore::default());

    let err = pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(raw),
        store.clone(),
    )
    .handle(&event())
    .await
    .unwrap_err();

    match err {
        SummarizeError::MalformedResponse(ref inner) => {
            assert!(matches!(inner, MalformedResponseError::InvalidJson { .. }));
            assert_eq!(inner.raw(), raw);
        }
        other => panic!("expected malformed response, got {other:?}"),
    }
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn missing_required_field_names_the_field() {
    let store = Arc::new(MemoryStore::default());
    let err = pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(r#"{"issue":"i","resolution":"r","sentiment":"neutral"}"#),
        store.clone(),
    )
    .handle(&event())
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SummarizeError::MalformedResponse(MalformedResponseError::MissingField {
            field: "category",
            ..
        })
    ));
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn unknown_transcript_is_unavailable_and_skips_inference() {
    let model = ScriptedModel::replying(FENCED_RESPONSE);
    let store = Arc::new(MemoryStore::default());

    let err = pipeline(
        FakeTranscripts::with("store://bucket/other.txt", TRANSCRIPT),
        model.clone(),
        store.clone(),
    )
    .handle(&event())
    .await
    .unwrap_err();

    match err {
        SummarizeError::TranscriptUnavailable { locator, source } => {
            assert_eq!(locator, "store://bucket/c1.txt");
            assert!(matches!(source, FetchError::NotFound(_)));
        }
        other => panic!("expected transcript failure, got {other:?}"),
    }
    assert_eq!(model.calls(), 0);
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn inference_failure_propagates_unchanged() {
    let store = Arc::new(MemoryStore::default());

    let err = pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::failing(),
        store.clone(),
    )
    .handle(&event())
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SummarizeError::Inference(InferenceError::Status { status: 429, .. })
    ));
    assert!(err.is_retryable());
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn persistence_failure_is_reported() {
    let store = Arc::new(MemoryStore {
        fail: true,
        ..Default::default()
    });

    let err = pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(FENCED_RESPONSE),
        store,
    )
    .handle(&event())
    .await
    .unwrap_err();

    assert!(matches!(err, SummarizeError::Persistence(_)));
    assert_eq!(err.kind(), "persistence");
}

#[tokio::test]
async fn overridden_params_reach_the_model() {
    let model = ScriptedModel::replying(FENCED_RESPONSE);
    let params = GenerationParams {
        max_tokens: 1024,
        temperature: Some(0.1),
    };

    SummarizationPipeline::new(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        model.clone(),
        Arc::new(MemoryStore::default()),
        TABLE,
    )
    .with_params(params)
    .handle(&event())
    .await
    .unwrap();

    assert_eq!(model.prompts.lock().unwrap()[0].1, params);
}

#[tokio::test]
async fn redelivered_event_overwrites_stored_record() {
    let tmp = tempdir().unwrap();
    let db = Arc::new(Database::open_path(&tmp.path().join("calldigest.db")).unwrap());

    for issue in ["First take", "Second take"] {
        let response = json!({
            "issue": issue,
            "resolution": "Refund issued",
            "sentiment": "positive",
            "category": "billing",
            "nextSteps": "Confirm refund posted"
        })
        .to_string();

        SummarizationPipeline::new(
            FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
            ScriptedModel::replying(&response),
            db.clone(),
            TABLE,
        )
        .handle(&event())
        .await
        .unwrap();
    }

    let items = db.query(TABLE, "c1").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["summary"]["issue"], "Second take");
    assert_eq!(items[0]["summary"]["nextSteps"], "Confirm refund posted");

    let stored = db
        .get(TABLE, "c1", Some("2025-11-08T10:00:00Z"))
        .await
        .unwrap();
    assert_eq!(stored, Some(items[0].clone()));
}

#[tokio::test]
async fn missing_event_time_is_stored_as_null() {
    let store = Arc::new(MemoryStore::default());
    let mut event = event();
    event.time = None;

    pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(FENCED_RESPONSE),
        store.clone(),
    )
    .handle(&event)
    .await
    .unwrap();

    assert_eq!(store.items()[0].1["timestamp"], Value::Null);
}

#[tokio::test]
async fn non_string_values_are_persisted_as_returned() {
    let store = Arc::new(MemoryStore::default());
    let response = json!({
        "issue": "Card declined",
        "resolution": "Card reissued",
        "sentiment": "neutral",
        "category": 7,
        "nextSteps": ["Call back", "Send card"]
    })
    .to_string();

    pipeline(
        FakeTranscripts::with("store://bucket/c1.txt", TRANSCRIPT),
        ScriptedModel::replying(&response),
        store.clone(),
    )
    .handle(&event())
    .await
    .unwrap();

    let items = store.items();
    let summary = &items[0].1["summary"];
    assert_eq!(summary["nextSteps"], json!(["Call back", "Send card"]));
    assert_eq!(summary["category"], json!(7));
}
