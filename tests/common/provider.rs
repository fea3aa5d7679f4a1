//! In-process provider that replays scripted rounds.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ollama_agent::agent::llm::{ChatStream, CompletionOptions, LlmError, LlmProvider};
use ollama_agent::agent::tools::ToolDefinition;
use ollama_agent::agent::{ChatChunk, Message};
use std::collections::VecDeque;
use std::sync::Mutex;

type Round = Vec<Result<ChatChunk, LlmError>>;

/// Replays one queued round per `chat` call and records what it was sent.
///
/// Once the queue is empty every further call answers with a plain
/// "ok" so a test cannot hang on a missing round.
#[derive(Default)]
pub struct ScriptedProvider {
    rounds: Mutex<VecDeque<Round>>,
    histories: Mutex<Vec<Vec<Message>>>,
    tool_catalogs: Mutex<Vec<Option<Vec<String>>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a round made only of successful fragments.
    pub fn with_round(self, chunks: Vec<ChatChunk>) -> Self {
        self.with_raw_round(chunks.into_iter().map(Ok).collect())
    }

    /// Queue a round that may contain failures.
    pub fn with_raw_round(self, round: Round) -> Self {
        self.rounds.lock().unwrap().push_back(round);
        self
    }

    pub fn with_repeated_round(mut self, chunks: Vec<ChatChunk>, n: usize) -> Self {
        for _ in 0..n {
            self = self.with_round(chunks.clone());
        }
        self
    }

    /// Number of `chat` calls made so far.
    pub fn calls(&self) -> usize {
        self.histories.lock().unwrap().len()
    }

    /// History sent on each call.
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories.lock().unwrap().clone()
    }

    /// Tool names offered on each call, `None` when no catalog was sent.
    pub fn tool_catalogs(&self) -> Vec<Option<Vec<String>>> {
        self.tool_catalogs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        _options: &CompletionOptions,
    ) -> Result<ChatStream, LlmError> {
        self.histories.lock().unwrap().push(messages.to_vec());
        self.tool_catalogs
            .lock()
            .unwrap()
            .push(tools.map(|t| t.iter().map(|d| d.name.clone()).collect()));

        let round = self
            .rounds
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![Ok(ChatChunk::content("ok").finished())]);

        Ok(stream::iter(round).boxed())
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}
