use super::registry::{parse_args, AgentTool, ToolContext, ToolDefinition, ToolError};
use super::schema::InputSchema;
use async_trait::async_trait;
use serde::Deserialize;

pub struct ReadFileTool;

#[derive(Debug, Deserialize)]
struct ReadFileInput {
    path: String,
}

#[async_trait]
impl AgentTool for ReadFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "read_file",
            "Read the contents of a given relative file path. Use this when you want to see \
             what's inside a file. Do not use this with directory names.",
            InputSchema::object().required_string(
                "path",
                "The relative path of a file in the working directory.",
            ),
        )
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let input: ReadFileInput = parse_args(args)?;
        let bytes = tokio::fs::read(ctx.resolve(&input.path))
            .await
            .map_err(|e| ToolError::io(&input.path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
