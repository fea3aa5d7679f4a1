//! Tool registry for agent capabilities.

use super::edit_file::EditFileTool;
use super::list_files::ListFilesTool;
use super::read_file::ReadFileTool;
use super::schema::InputSchema;
use crate::agent::llm::{Message, ToolCall};
use crate::agent::session::SessionOutput;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Content of the tool message produced for an unregistered tool name.
pub const TOOL_NOT_FOUND: &str = "tool not found";

/// Definition of a tool that an agent can use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool (must be unique within a registry).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// Schema describing the tool's parameters.
    pub parameters: InputSchema,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Context provided to tools when they are executed.
///
/// Relative tool paths resolve against `working_dir`. Absolute paths
/// and `..` components are honored as given; there is no sandbox.
#[derive(Debug, Clone)]
pub struct ToolContext {
    working_dir: PathBuf,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolve a path argument the way the model meant it.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.working_dir.join(path)
    }
}

/// Errors that can occur when executing a tool.
///
/// All of them are recoverable: the executor turns them into tool
/// messages the model can read.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ExecutionFailed(String),
}

impl ToolError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Decode a tool's raw arguments into its typed input.
///
/// Models occasionally send the arguments as a JSON-encoded string, or
/// nothing at all for tools without required parameters; both are accepted.
pub fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, ToolError> {
    let args = match args {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        serde_json::Value::String(raw) if raw.trim().is_empty() => {
            serde_json::Value::Object(Default::default())
        }
        serde_json::Value::String(raw) => serde_json::from_str(&raw).map_err(|e| {
            ToolError::InvalidArguments(format!("arguments are not valid JSON: {}", e))
        })?,
        other => other,
    };

    if !args.is_object() {
        return Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".to_string(),
        ));
    }

    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Trait for tools that agents can use.
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Get the tool's definition (name, description, parameters).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments.
    ///
    /// # Arguments
    /// * `args` - The arguments passed by the model (as JSON).
    /// * `ctx` - The execution context.
    ///
    /// # Returns
    /// The tool's textual output, which is fed back to the model verbatim.
    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext)
        -> Result<String, ToolError>;
}

/// Registry for managing agent tools.
///
/// Built once at startup and shared read-only afterwards. Iteration
/// order is registration order, so the published catalog is stable.
pub struct AgentToolRegistry {
    tools: Vec<Arc<dyn AgentTool>>,
}

impl AgentToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The file-system tools: `read_file`, `list_files`, `edit_file`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ReadFileTool);
        registry.register(ListFilesTool);
        registry.register(EditFileTool);
        registry
    }

    /// Register a tool, replacing any tool with the same name in place.
    pub fn register(&mut self, tool: impl AgentTool + 'static) {
        let name = tool.definition().name;
        let tool: Arc<dyn AgentTool> = Arc::new(tool);
        match self
            .tools
            .iter()
            .position(|t| t.definition().name == name)
        {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools
            .iter()
            .find(|t| t.definition().name == name)
            .cloned()
    }

    /// Get all tool definitions.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run a tool by name, surfacing the failure as a value.
    pub async fn run(
        &self,
        name: &str,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(args, ctx).await
    }

    /// Execute a tool call requested by the model.
    ///
    /// Never fails: unknown tools and handler failures become the
    /// content of the returned `tool` message.
    pub async fn execute(
        &self,
        call: &ToolCall,
        ctx: &ToolContext,
        out: &mut dyn SessionOutput,
    ) -> Message {
        if !self.contains(&call.name) {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return Message::tool(TOOL_NOT_FOUND);
        }

        out.tool_invocation(&call.name, &call.arguments);
        info!(
            tool = %call.name,
            arguments = %call.arguments,
            working_dir = %ctx.working_dir().display(),
            "Executing tool"
        );

        match self.run(&call.name, call.arguments.clone(), ctx).await {
            Ok(output) => Message::tool(output),
            Err(e) => {
                debug!(tool = %call.name, error = %e, "Tool failed");
                Message::tool(e.to_string())
            }
        }
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.definition().name == name)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for AgentToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
