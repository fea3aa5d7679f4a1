use super::registry::{parse_args, AgentTool, ToolContext, ToolDefinition, ToolError};
use super::schema::InputSchema;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Component, Path};
use walkdir::WalkDir;

pub struct ListFilesTool;

#[derive(Debug, Default, Deserialize)]
struct ListFilesInput {
    #[serde(default)]
    path: Option<String>,
}

#[async_trait]
impl AgentTool for ListFilesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_files",
            "List files and directories at a given path. If no path is provided, lists files \
             in the current directory.",
            InputSchema::object().optional_string(
                "path",
                "Optional relative path to list files from. Defaults to current directory if \
                 not provided.",
            ),
        )
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let input: ListFilesInput = parse_args(args)?;
        let path = input
            .path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());
        let root = ctx.resolve(&path);

        let entries = tokio::task::spawn_blocking(move || walk(&root, &path))
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("listing task failed: {}", e)))??;

        serde_json::to_string(&entries)
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to encode listing: {}", e)))
    }
}

/// Every entry below `root`, depth-first in name order. Directories end in `/`.
fn walk(root: &Path, shown_as: &str) -> Result<Vec<String>, ToolError> {
    let mut entries = Vec::new();

    // The root itself is yielded at depth 0; it is checked for errors but not listed.
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| shown_as.to_string());
            match e.into_io_error() {
                Some(io) => ToolError::io(path, io),
                None => ToolError::ExecutionFailed(format!("{}: filesystem loop detected", path)),
            }
        })?;

        if entry.depth() == 0 {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let mut name = to_slash_path(relative);
        if entry.file_type().is_dir() {
            name.push('/');
        }
        entries.push(name);
    }

    Ok(entries)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
