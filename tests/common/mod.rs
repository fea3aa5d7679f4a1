//! Common test infrastructure
//!
//! Two ways to stand in for an Ollama server:
//! - [`ScriptedProvider`] implements `LlmProvider` directly and replays
//!   queued fragment sequences, one per inference round.
//! - [`FakeOllama`] is a real HTTP server on a random port that answers
//!   `/api/chat` and `/api/tags` with queued bodies, for exercising the
//!   HTTP adapter end to end.
//!
//! Tests should only import from this module, not from internal submodules.

#![allow(dead_code, unused_imports)]

mod fake_ollama;
mod provider;

pub use fake_ollama::{FakeOllama, FakeReply};
pub use provider::ScriptedProvider;

use ollama_agent::agent::ToolCall;
use serde_json::Value;

pub fn call(name: &str, arguments: Value) -> ToolCall {
    ToolCall::new(name, arguments)
}
