//! Terminal chat agent backed by an Ollama server.
//!
//! The model can call back into a small set of file-system tools
//! (`read_file`, `list_files`, `edit_file`) between inference rounds.

pub mod agent;
pub mod cli_style;
pub mod config;
pub mod console;
