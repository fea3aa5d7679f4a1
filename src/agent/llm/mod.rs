//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for inference backends.
//! The conversation loop only sees [`LlmProvider`] and the [`ChatChunk`]
//! fragments it yields; [`OllamaProvider`] is the one concrete backend.

mod ndjson;
mod ollama;
mod provider;
mod types;

pub use ndjson::NdjsonDecoder;
pub use ollama::{normalize_host, OllamaProvider};
pub use provider::{ChatStream, CompletionOptions, LlmError, LlmProvider};
pub use types::{ChatChunk, Message, MessageRole, ToolCall};
