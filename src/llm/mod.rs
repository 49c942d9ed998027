//! LLM module for calldigest
//!
//! Prompt construction and the inference providers that answer it.

mod anthropic;
mod client;
mod gemini;
mod prompts;

pub use anthropic::AnthropicClient;
pub use client::{
    build_provider, GenerateRequest, GenerationParams, InferenceClient, InferenceError,
};
pub use gemini::GeminiClient;
pub use prompts::build_summarization_prompt;
