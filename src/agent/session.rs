//! Session input/output seams.
//!
//! The conversation loop reads user lines from an [`InputSource`] and
//! reports what happens to a [`SessionOutput`]. The terminal versions live
//! in `crate::console`; [`ScriptedInput`] and [`Transcript`] are the in-memory
//! versions used to drive and observe a session without a terminal.

use std::collections::VecDeque;

/// Prompt shown before each user input.
pub const USER_PROMPT: &str = "You: ";

/// Source of user input lines.
pub trait InputSource {
    /// Show `prompt` and block for one line.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;
}

/// Where the visible side of a session goes.
pub trait SessionOutput: Send {
    /// Printed once per turn, before the first inference round.
    fn assistant_prefix(&mut self);

    /// A content fragment, shown as soon as it arrives.
    fn assistant_delta(&mut self, text: &str);

    /// A tool is about to run.
    fn tool_invocation(&mut self, name: &str, arguments: &serde_json::Value);

    /// Blank line between turns.
    fn turn_separator(&mut self);
}

/// Input lines given up front.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts_shown: usize,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts_shown: 0,
        }
    }

    /// How many times a prompt was shown, including the one answered by end of input.
    pub fn prompts_shown(&self) -> usize {
        self.prompts_shown
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> anyhow::Result<Option<String>> {
        self.prompts_shown += 1;
        Ok(self.lines.pop_front())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    AssistantPrefix,
    AssistantDelta(String),
    ToolInvocation {
        name: String,
        arguments: serde_json::Value,
    },
    TurnSeparator,
}

/// Records session output in memory.
#[derive(Debug, Default)]
pub struct Transcript {
    events: Vec<TranscriptEvent>,
}

impl Transcript {
    pub fn events(&self) -> &[TranscriptEvent] {
        &self.events
    }

    /// All streamed assistant content, concatenated.
    pub fn assistant_text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                TranscriptEvent::AssistantDelta(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of the tools announced, in order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TranscriptEvent::ToolInvocation { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SessionOutput for Transcript {
    fn assistant_prefix(&mut self) {
        self.events.push(TranscriptEvent::AssistantPrefix);
    }

    fn assistant_delta(&mut self, text: &str) {
        self.events
            .push(TranscriptEvent::AssistantDelta(text.to_string()));
    }

    fn tool_invocation(&mut self, name: &str, arguments: &serde_json::Value) {
        self.events.push(TranscriptEvent::ToolInvocation {
            name: name.to_string(),
            arguments: arguments.clone(),
        });
    }

    fn turn_separator(&mut self) {
        self.events.push(TranscriptEvent::TurnSeparator);
    }
}
