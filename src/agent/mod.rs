//! Tool-augmented chat agent.
//!
//! This module provides:
//! - LLM provider abstraction (Ollama `/api/chat`, streamed or not)
//! - Tool registry with the built-in file-system tools
//! - The conversation loop that alternates inference and tool execution
//! - Input/output seams for running a session

pub mod conversation;
pub mod llm;
pub mod session;
pub mod tools;

pub use conversation::{
    default_control_tokens, strip_control_tokens, Agent, AgentError, AgentSettings, Conversation,
    TurnSummary,
};
pub use llm::{
    ChatChunk, ChatStream, CompletionOptions, LlmError, LlmProvider, Message, MessageRole,
    OllamaProvider, ToolCall,
};
pub use session::{InputSource, ScriptedInput, SessionOutput, Transcript, TranscriptEvent};
pub use tools::{AgentTool, AgentToolRegistry, ToolContext, ToolDefinition, ToolError};
