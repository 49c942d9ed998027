use async_trait::async_trait;
use thiserror::Error;

use crate::config::Settings;
use crate::llm::anthropic::AnthropicClient;
use crate::llm::gemini::GeminiClient;

/// Any failure talking to the model-serving endpoint.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference provider misconfigured: {0}")]
    Config(String),

    #[error("Inference request failed")]
    Transport(#[source] reqwest::Error),

    #[error("Inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode inference response")]
    Decode(#[source] reqwest::Error),

    #[error("Inference response did not contain any text")]
    EmptyResponse,
}

impl InferenceError {
    /// Wrap a request failure, dropping the URL so endpoint credentials
    /// never reach logs.
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }

    /// Wrap a body decoding failure, dropping the URL.
    pub fn decode(err: reqwest::Error) -> Self {
        Self::Decode(err.without_url())
    }
}

/// Generation parameters applied to a single call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    /// `None` leaves the provider default in place
    pub temperature: Option<f32>,
}

impl GenerationParams {
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_tokens: settings.llm.max_tokens,
            temperature: Some(settings.llm.temperature),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Some(Self::DEFAULT_TEMPERATURE),
        }
    }
}

/// Completion request payload.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub system_prompt: Option<&'a str>,
    pub prompt: &'a str,
    pub params: GenerationParams,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Identifier of the model answering requests.
    fn model(&self) -> &str;

    async fn complete(&self, request: GenerateRequest<'_>) -> Result<String, InferenceError>;

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, InferenceError> {
        self.complete(GenerateRequest {
            system_prompt: None,
            prompt,
            params: GenerationParams {
                max_tokens,
                temperature: Some(temperature),
            },
        })
        .await
    }

    async fn generate_with_system_prompt(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError> {
        self.complete(GenerateRequest {
            system_prompt: Some(system_prompt),
            prompt: user_prompt,
            params: GenerationParams {
                max_tokens,
                temperature: None,
            },
        })
        .await
    }
}

/// Build an inference client from runtime settings.
pub fn build_provider(settings: &Settings) -> Result<Box<dyn InferenceClient>, InferenceError> {
    match settings.llm.provider.to_lowercase().as_str() {
        "gemini" => Ok(Box::new(GeminiClient::from_settings(settings)?)),
        "anthropic" => Ok(Box::new(AnthropicClient::from_settings(settings)?)),
        other => Err(InferenceError::Config(format!(
            "Unsupported llm.provider '{}'. Supported providers: gemini, anthropic",
            other
        ))),
    }
}

/// Pick the first non-empty trimmed text out of a provider's content parts.
pub(crate) fn first_text<'a>(
    parts: impl IntoIterator<Item = Option<&'a str>>,
) -> Result<String, InferenceError> {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(InferenceError::EmptyResponse)
}

/// Turn a non-success HTTP response into `InferenceError::Status`.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(InferenceError::Status {
        status: status.as_u16(),
        body,
    })
}
