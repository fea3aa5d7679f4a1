//! Agent tool registry and execution.
//!
//! Tools are functions the model can call mid-conversation. This module
//! provides the trait definition, the registry that executes calls, and
//! the built-in file-system tools.

mod edit_file;
mod list_files;
mod read_file;
mod registry;
mod schema;

pub use edit_file::EditFileTool;
pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;
pub use registry::{
    parse_args, AgentTool, AgentToolRegistry, ToolContext, ToolDefinition, ToolError,
    TOOL_NOT_FOUND,
};
pub use schema::{InputSchema, PropertySchema};
