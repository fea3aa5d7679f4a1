//! LLM provider trait definition.

use super::types::{ChatChunk, Message};
use crate::agent::tools::ToolDefinition;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

/// Options for a chat request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Ask the backend to deliver the response incrementally.
    pub stream: bool,
    /// Sampling temperature. `None` leaves the backend default.
    pub temperature: Option<f32>,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            stream: true,
            temperature: None,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Request timeout")]
    Timeout,
}

/// The fragments of one inference call, in delivery order.
///
/// The stream ends after the backend signals completion; an `Err` item ends the call.
pub type ChatStream = BoxStream<'static, Result<ChatChunk, LlmError>>;

/// Trait for LLM providers.
///
/// Implementations connect to an inference backend and deliver the
/// response as a sequence of [`ChatChunk`] fragments.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider's name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Send the whole conversation and the tool catalog.
    ///
    /// # Arguments
    /// * `messages` - The full conversation history, re-sent on every call.
    /// * `tools` - The tool catalog the model may call, if any.
    /// * `options` - Streaming flag, temperature, timeout.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        options: &CompletionOptions,
    ) -> Result<ChatStream, LlmError>;

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> Result<(), LlmError>;
}
