use super::registry::{parse_args, AgentTool, ToolContext, ToolDefinition, ToolError};
use super::schema::InputSchema;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

pub struct EditFileTool;

#[derive(Debug, Deserialize)]
struct EditFileInput {
    path: String,
    old_str: String,
    new_str: String,
}

#[async_trait]
impl AgentTool for EditFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "edit_file",
            "Make edits to a text file.\n\n\
             Replaces 'old_str' with 'new_str' in the given file. 'old_str' and 'new_str' \
             MUST be different from each other.\n\n\
             If the file specified with path doesn't exist, it will be created.\n",
            InputSchema::object()
                .required_string("path", "The path to the file")
                .required_string(
                    "old_str",
                    "Text to search for - must match exactly and must only have one match exactly",
                )
                .required_string("new_str", "Text to replace old_str with"),
        )
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let input: EditFileInput = parse_args(args)?;
        let target = ctx.resolve(&input.path);

        let bytes = match tokio::fs::read(&target).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound && input.old_str.is_empty() => {
                return create_new_file(&target, &input.path, &input.new_str).await;
            }
            Err(e) => return Err(ToolError::io(&input.path, e)),
        };

        let old_content = String::from_utf8(bytes).map_err(|_| {
            ToolError::ExecutionFailed(format!("{}: file is not valid UTF-8 text", input.path))
        })?;

        // An empty old_str on an existing file rewrites it with new_str,
        // so repeating a creation call leaves the same content behind.
        let new_content = if input.old_str.is_empty() {
            input.new_str.clone()
        } else {
            if !old_content.contains(&input.old_str) {
                return Err(ToolError::ExecutionFailed(
                    "old_str not found in file".to_string(),
                ));
            }
            old_content.replace(&input.old_str, &input.new_str)
        };

        tokio::fs::write(&target, new_content)
            .await
            .map_err(|e| ToolError::io(&input.path, e))?;

        Ok("OK".to_string())
    }
}

async fn create_new_file(target: &Path, shown_as: &str, content: &str) -> Result<String, ToolError> {
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ToolError::ExecutionFailed(format!("failed to create directory: {}", e))
        })?;
    }

    tokio::fs::write(target, content)
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("failed to create file: {}", e)))?;

    Ok(format!("Successfully created file {}", shown_as))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn edit(ctx: &ToolContext, path: &str, old: &str, new: &str) -> Result<String, ToolError> {
        EditFileTool
            .execute(
                serde_json::json!({"path": path, "old_str": old, "new_str": new}),
                ctx,
            )
            .await
    }

    #[tokio::test]
    async fn test_replace_in_place() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello world").unwrap();
        let ctx = ToolContext::new(dir.path());

        let output = edit(&ctx, "notes.txt", "world", "there").await.unwrap();
        assert_eq!(output, "OK");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "hello there");
    }

    #[tokio::test]
    async fn test_replaces_every_occurrence() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "foo bar foo baz foo").unwrap();
        let ctx = ToolContext::new(dir.path());

        edit(&ctx, "a.txt", "foo", "qux").await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "qux bar qux baz qux");
    }

    #[tokio::test]
    async fn test_no_match_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "unchanged").unwrap();
        let ctx = ToolContext::new(dir.path());

        let err = edit(&ctx, "a.txt", "absent", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "old_str not found in file");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "unchanged");
    }

    #[tokio::test]
    async fn test_replacement_equal_to_original_still_succeeds() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "same").unwrap();
        let ctx = ToolContext::new(dir.path());

        assert_eq!(edit(&ctx, "a.txt", "same", "same").await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());

        let output = edit(&ctx, "new/dir/file.txt", "", "content").await.unwrap();
        assert_eq!(output, "Successfully created file new/dir/file.txt");
        assert!(dir.path().join("new/dir").is_dir());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("new/dir/file.txt")).unwrap(),
            "content"
        );
    }

    #[tokio::test]
    async fn test_creation_is_idempotent_then_edits_in_place() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("p4.txt");
        let ctx = ToolContext::new(dir.path());

        edit(&ctx, "p4.txt", "", "alpha beta").await.unwrap();
        edit(&ctx, "p4.txt", "", "alpha beta").await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "alpha beta");

        assert_eq!(edit(&ctx, "p4.txt", "beta", "gamma").await.unwrap(), "OK");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "alpha gamma");
    }

    #[tokio::test]
    async fn test_missing_file_with_old_str_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());

        let err = edit(&ctx, "ghost.txt", "x", "y").await.unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
        assert!(!dir.path().join("ghost.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_or_non_string_arguments() {
        let ctx = ToolContext::new(".");

        for args in [
            serde_json::json!({"old_str": "", "new_str": "x"}),
            serde_json::json!({"path": "a", "new_str": "x"}),
            serde_json::json!({"path": "a", "old_str": ""}),
            serde_json::json!({"path": 1, "old_str": "", "new_str": "x"}),
        ] {
            let err = EditFileTool.execute(args, &ctx).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)));
        }
    }
}
