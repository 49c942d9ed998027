use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::llm::client::{
    check_status, first_text, GenerateRequest, InferenceClient, InferenceError,
};

const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Messages API.
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, InferenceError> {
        let api_key = settings.llm.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(InferenceError::Config(
                "Anthropic API key is missing. Set llm.api_key in config or CALLDIGEST_API_KEY."
                    .to_string(),
            ));
        }

        let model = if settings.llm.model.trim().is_empty() {
            DEFAULT_ANTHROPIC_MODEL.to_string()
        } else {
            settings.llm.model.trim().to_string()
        };

        let endpoint = if settings.llm.endpoint.trim().is_empty() {
            DEFAULT_ANTHROPIC_ENDPOINT.to_string()
        } else {
            settings
                .llm
                .endpoint
                .trim()
                .trim_end_matches('/')
                .to_string()
        };

        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(settings.llm.timeout_secs))
                .build()
                .map_err(|e| {
                    InferenceError::Config(format!("Failed to build Anthropic HTTP client: {e}"))
                })?,
            api_key,
            model,
            endpoint,
        })
    }

    fn request_url(&self) -> String {
        format!("{}/v1/messages", self.endpoint)
    }
}

#[async_trait]
impl InferenceClient for AnthropicClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: GenerateRequest<'_>) -> Result<String, InferenceError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.params.max_tokens,
            temperature: request.params.temperature,
            system: request.system_prompt,
            messages: vec![Message {
                role: "user",
                content: request.prompt,
            }],
        };

        tracing::debug!(model = %self.model, "Sending Anthropic messages request");
        let response = self
            .http
            .post(self.request_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(InferenceError::transport)?;

        let response = check_status(response).await?;

        let payload: MessagesResponse = response.json().await.map_err(InferenceError::decode)?;

        first_text(
            payload
                .content
                .iter()
                .filter(|block| block.kind == "text")
                .map(|block| block.text.as_deref()),
        )
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}
