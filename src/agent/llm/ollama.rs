//! Ollama LLM provider implementation.

use super::ndjson::NdjsonDecoder;
use super::provider::{ChatStream, CompletionOptions, LlmError, LlmProvider};
use super::types::{ChatChunk, Message, MessageRole, ToolCall};
use crate::agent::tools::{InputSchema, ToolDefinition};
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Normalize a host value into a base URL.
///
/// `OLLAMA_HOST` is commonly given as `host:port` without a scheme.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Ollama LLM provider.
///
/// Connects to an Ollama server and uses its `/api/chat` endpoint
/// for chat with tool support, streamed or in one piece.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// # Arguments
    /// * `host` - Ollama server location (e.g., "localhost:11435" or "http://gpu-box:11434").
    /// * `model` - Model to use (e.g., "qwen2.5-coder:32b-instruct-q8_0").
    pub fn new(host: &str, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_host(host),
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_ollama_tools(tools: &[ToolDefinition]) -> Vec<OllamaTool> {
        tools.iter().map(|t| t.into()).collect()
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        options: &CompletionOptions,
    ) -> Result<ChatStream, LlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let request = OllamaChatRequest {
            model: &self.model,
            messages: messages.iter().map(|m| m.into()).collect(),
            tools: tools.map(Self::to_ollama_tools),
            stream: options.stream,
            options: options.temperature.map(|temperature| OllamaOptions {
                temperature: Some(temperature),
            }),
        };

        debug!(
            model = %self.model,
            message_count = messages.len(),
            has_tools = tools.is_some(),
            stream = options.stream,
            "Sending chat request to Ollama"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        if options.stream {
            let bytes = response.bytes_stream().map_err(map_transport_error).boxed();
            return Ok(decode_chat_stream(bytes));
        }

        let body: OllamaChatResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;
        let chunk = body.into_chunk();
        Ok(stream::iter(vec![chunk]).boxed())
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(LlmError::Api {
                status: response.status().as_u16(),
                message: "Health check failed".to_string(),
            });
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse tags response: {}", e))
        })?;

        let model_exists = tags.models.iter().any(|m| m.name == self.model);
        if !model_exists {
            warn!(
                model = %self.model,
                available_models = ?tags.models.iter().map(|m| &m.name).collect::<Vec<_>>(),
                "Configured model not found in Ollama"
            );
        }

        Ok(())
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Connection(e.to_string())
    }
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<OllamaErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string())
}

struct DecodeState<S> {
    bytes: S,
    decoder: NdjsonDecoder,
    pending: VecDeque<Result<ChatChunk, LlmError>>,
    saw_done: bool,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn enqueue(&mut self, record: Result<OllamaChatResponse, serde_json::Error>) {
        let item = match record {
            Ok(response) => response.into_chunk(),
            Err(e) => Err(LlmError::InvalidResponse(format!(
                "Failed to parse Ollama stream line: {}",
                e
            ))),
        };
        match &item {
            Ok(chunk) if chunk.done => self.saw_done = true,
            Ok(_) => {}
            // An error ends the call; drop anything after it.
            Err(_) => self.finished = true,
        }
        self.pending.push_back(item);
    }
}

/// Turn the raw NDJSON body of a streaming `/api/chat` call into fragments.
fn decode_chat_stream<S, B>(bytes: S) -> ChatStream
where
    S: Stream<Item = Result<B, LlmError>> + Send + Unpin + 'static,
    B: AsRef<[u8]>,
{
    let state = DecodeState {
        bytes,
        decoder: NdjsonDecoder::new(),
        pending: VecDeque::new(),
        saw_done: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for record in state.decoder.push(chunk.as_ref()) {
                        if state.finished {
                            break;
                        }
                        state.enqueue(record);
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.push_back(Err(e));
                }
                None => {
                    if let Some(record) = state.decoder.finish() {
                        state.enqueue(record);
                    }
                    // A body cut off before the `done` record is not an answer.
                    if !state.finished && !state.saw_done {
                        state.pending.push_back(Err(LlmError::InvalidResponse(
                            "stream ended before done".to_string(),
                        )));
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaRequestMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OllamaRequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for OllamaRequestMessage<'a> {
    fn from(msg: &'a Message) -> Self {
        OllamaRequestMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OllamaFunctionDef,
}

impl From<&ToolDefinition> for OllamaTool {
    fn from(def: &ToolDefinition) -> Self {
        OllamaTool {
            tool_type: "function".to_string(),
            function: OllamaFunctionDef {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaFunctionDef {
    name: String,
    description: String,
    parameters: InputSchema,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaChatResponse {
    fn into_chunk(self) -> Result<ChatChunk, LlmError> {
        if let Some(error) = self.error {
            return Err(LlmError::Backend(error));
        }

        if self.done {
            debug!(done_reason = ?self.done_reason, "Ollama signalled end of response");
        }

        let message = self.message.unwrap_or_default();
        let role = match message.role.as_str() {
            "tool" => MessageRole::Tool,
            "user" => MessageRole::User,
            "system" => MessageRole::System,
            _ => MessageRole::Assistant,
        };

        Ok(ChatChunk {
            role,
            content: message.content,
            tool_calls: message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| ToolCall::new(tc.function.name, tc.function.arguments))
                .collect(),
            done: self.done,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}
