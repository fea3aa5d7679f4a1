use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Settings read from the optional TOML config file.
///
/// Every field is optional; present values override the CLI.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub ollama_host: Option<String>,
    pub model: Option<String>,
    pub stream: Option<bool>,
    pub tools_enabled: Option<bool>,
    pub max_tool_rounds: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub working_dir: Option<String>,
    pub control_tokens: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config = FileConfig::parse(
            r#"
            ollama_host = "gpu-box:11434"
            model = "llama3.1:8b"
            stream = false
            tools_enabled = true
            max_tool_rounds = 8
            request_timeout_secs = 60
            temperature = 0.2
            system_prompt = "You are a careful coding assistant."
            working_dir = "/srv/project"
            control_tokens = ["<|eot_id|>"]
            "#,
        )
        .unwrap();

        assert_eq!(config.ollama_host.as_deref(), Some("gpu-box:11434"));
        assert_eq!(config.model.as_deref(), Some("llama3.1:8b"));
        assert_eq!(config.stream, Some(false));
        assert_eq!(config.max_tool_rounds, Some(8));
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.control_tokens, Some(vec!["<|eot_id|>".to_string()]));
    }

    #[test]
    fn test_parse_empty_file() {
        let config = FileConfig::parse("").unwrap();
        assert!(config.ollama_host.is_none());
        assert!(config.control_tokens.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("olama_host = \"typo\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/agent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
