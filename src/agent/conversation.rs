//! The tool-augmented conversation loop.
//!
//! A turn starts with one user line and ends with one plain assistant
//! message. In between, every inference round that requested tools is
//! recorded as a single `tool` message and followed by another round.

use crate::agent::llm::{CompletionOptions, LlmError, LlmProvider, Message, MessageRole};
use crate::agent::session::{InputSource, SessionOutput, USER_PROMPT};
use crate::agent::tools::{AgentToolRegistry, ToolContext};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that end a turn.
///
/// Tool failures never show up here: they are fed back to the model.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Model was still requesting tools after {0} inference rounds")]
    ToolRoundLimit(usize),

    #[error("Failed to read user input: {0:#}")]
    Input(anyhow::Error),
}

/// Append-only conversation history.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the history with a system message.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Append a message. Nothing else mutates the history.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Maximum inference rounds in one turn.
    pub max_tool_rounds: usize,
    /// Backend control markers removed from recorded messages.
    pub control_tokens: Vec<String>,
    pub completion_options: CompletionOptions,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: 25,
            control_tokens: default_control_tokens(),
            completion_options: CompletionOptions::default(),
        }
    }
}

pub fn default_control_tokens() -> Vec<String> {
    vec!["<|im_start|>".to_string(), "<|im_end|>".to_string()]
}

/// What a finished turn took.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Inference rounds, including the final one.
    pub rounds: usize,
    /// Tool calls executed across all rounds.
    pub tool_calls: usize,
}

/// Drives turns against one provider and one tool registry.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<AgentToolRegistry>,
    ctx: ToolContext,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<AgentToolRegistry>,
        ctx: ToolContext,
    ) -> Self {
        Self {
            provider,
            tools,
            ctx,
            settings: AgentSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Read lines until the input is exhausted, running one turn per line.
    pub async fn run_session(
        &self,
        conversation: &mut Conversation,
        input: &mut dyn InputSource,
        out: &mut dyn SessionOutput,
    ) -> Result<(), AgentError> {
        loop {
            let Some(line) = input.read_line(USER_PROMPT).map_err(AgentError::Input)? else {
                info!(messages = conversation.len(), "Input exhausted, ending session");
                return Ok(());
            };

            let summary = self.run_turn(conversation, line, out).await?;
            debug!(
                rounds = summary.rounds,
                tool_calls = summary.tool_calls,
                "Turn completed"
            );
            out.turn_separator();
        }
    }

    /// Run one turn: record the user line, then infer until the model answers.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: String,
        out: &mut dyn SessionOutput,
    ) -> Result<TurnSummary, AgentError> {
        conversation.push(Message::user(input));
        out.assistant_prefix();

        let mut summary = TurnSummary::default();
        loop {
            if summary.rounds >= self.settings.max_tool_rounds {
                return Err(AgentError::ToolRoundLimit(summary.rounds));
            }
            summary.rounds += 1;

            let (message, tool_calls) = self.run_round(conversation.messages(), out).await?;
            summary.tool_calls += tool_calls;

            let role = message.role;
            conversation.push(message);
            if role != MessageRole::Tool {
                return Ok(summary);
            }
        }
    }

    /// One inference call. Tool calls run as soon as their fragment arrives.
    async fn run_round(
        &self,
        history: &[Message],
        out: &mut dyn SessionOutput,
    ) -> Result<(Message, usize), AgentError> {
        let definitions = self.tools.definitions();
        let tools = if definitions.is_empty() {
            None
        } else {
            Some(definitions.as_slice())
        };

        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            history = history.len(),
            "Starting inference round"
        );

        let mut fragments = self
            .provider
            .chat(history, tools, &self.settings.completion_options)
            .await?;

        let mut round = RoundAccumulator::default();
        let mut finished = false;
        while let Some(chunk) = fragments.next().await {
            let chunk = chunk?;

            for call in &chunk.tool_calls {
                let result = self.tools.execute(call, &self.ctx, out).await;
                round.push_tool_result(result.content);
            }

            if !chunk.content.is_empty() {
                out.assistant_delta(&chunk.content);
                round.push_content(chunk.role, &chunk.content);
            }

            if chunk.done {
                finished = true;
                break;
            }
        }

        if !finished {
            return Err(LlmError::InvalidResponse("stream ended before done".to_string()).into());
        }

        let tool_calls = round.tool_calls;
        Ok((round.finish(&self.settings.control_tokens), tool_calls))
    }
}

/// Collects the fragments of one round into the message that gets recorded.
///
/// Consecutive content fragments form one token; each tool result is its
/// own token. Tokens are joined with a single space. Any tool call in the
/// round makes it a `tool` message, wherever the call fell in the sequence.
#[derive(Debug, Default)]
struct RoundAccumulator {
    tokens: Vec<String>,
    in_content: bool,
    content_role: Option<MessageRole>,
    tool_calls: usize,
}

impl RoundAccumulator {
    fn push_tool_result(&mut self, content: String) {
        self.tool_calls += 1;
        self.tokens.push(content);
        self.in_content = false;
    }

    fn push_content(&mut self, role: MessageRole, text: &str) {
        if self.in_content {
            if let Some(last) = self.tokens.last_mut() {
                last.push_str(text);
            }
        } else {
            self.tokens.push(text.to_string());
        }
        self.in_content = true;
        self.content_role = Some(role);
    }

    fn finish(self, control_tokens: &[String]) -> Message {
        let role = if self.tool_calls > 0 {
            MessageRole::Tool
        } else {
            self.content_role.unwrap_or(MessageRole::Assistant)
        };
        let content = strip_control_tokens(&self.tokens.join(" "), control_tokens);
        Message::new(role, content)
    }
}

/// Remove every occurrence of the backend's control markers.
pub fn strip_control_tokens(text: &str, control_tokens: &[String]) -> String {
    control_tokens
        .iter()
        .filter(|t| !t.is_empty())
        .fold(text.to_string(), |acc, token| acc.replace(token.as_str(), ""))
}
