//! Terminal side of a chat session.

use crate::agent::session::{InputSource, SessionOutput};
use crate::cli_style::{colors, label};
use crossterm::style::Stylize;
use rustyline::{
    completion::Completer, error::ReadlineError, highlight::Highlighter, history::MemHistory,
    validate::Validator, Config, Editor, Helper,
};
use std::borrow::Cow;
use std::io::{self, Stdout, Write};

#[derive(rustyline_derive::Hinter)]
struct PromptHelper;

impl Completer for PromptHelper {
    type Candidate = String;
}

impl Highlighter for PromptHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        match prompt.strip_suffix(": ") {
            Some(name) => Cow::Owned(label(name, colors::USER)),
            None => Cow::Borrowed(prompt),
        }
    }
}

impl Validator for PromptHelper {}
impl Helper for PromptHelper {}

/// Reads user lines with rustyline. History is kept in memory only.
pub struct ReadlineInput {
    editor: Editor<PromptHelper, MemHistory>,
}

impl ReadlineInput {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::builder().build();
        let mut editor = Editor::<PromptHelper, MemHistory>::with_history(config, MemHistory::new())?;
        editor.set_helper(Some(PromptHelper));
        Ok(Self { editor })
    }
}

impl InputSource for ReadlineInput {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        let line = end_of_input(self.editor.readline(prompt))?;
        if let Some(line) = line.as_deref().filter(|l| !l.trim().is_empty()) {
            let _ = self.editor.add_history_entry(line);
        }
        Ok(line)
    }
}

/// Ctrl-D and Ctrl-C at the prompt both end the session quietly.
fn end_of_input(read: Result<String, ReadlineError>) -> anyhow::Result<Option<String>> {
    match read {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes the session to stdout with colored labels.
pub struct TerminalOutput {
    stdout: Stdout,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionOutput for TerminalOutput {
    fn assistant_prefix(&mut self) {
        let _ = write!(self.stdout, "{}", label("Ollama", colors::ASSISTANT));
        let _ = self.stdout.flush();
    }

    fn assistant_delta(&mut self, text: &str) {
        let _ = write!(self.stdout, "{}", text);
        let _ = self.stdout.flush();
    }

    fn tool_invocation(&mut self, name: &str, arguments: &serde_json::Value) {
        let _ = writeln!(
            self.stdout,
            "{}{}({})",
            label("tool", colors::TOOL),
            name,
            arguments.to_string().with(colors::DIM)
        );
        let _ = self.stdout.flush();
    }

    fn turn_separator(&mut self) {
        let _ = writeln!(self.stdout);
        let _ = self.stdout.flush();
    }
}
