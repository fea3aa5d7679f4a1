mod file_config;

pub use file_config::FileConfig;

use crate::agent::llm::{normalize_host, CompletionOptions};
use crate::agent::{default_control_tokens, AgentSettings};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OLLAMA_HOST: &str = "localhost:11435";
pub const DEFAULT_MODEL: &str = "qwen2.5-coder:32b-instruct-q8_0";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub ollama_host: String,
    pub model: String,
    pub stream: bool,
    pub tools_enabled: bool,
    pub max_tool_rounds: usize,
    pub request_timeout_secs: u64,
    pub working_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream: true,
            tools_enabled: true,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            working_dir: None,
        }
    }
}

/// Fully resolved settings, passed down explicitly from `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Ollama server, scheme included.
    pub ollama_host: String,
    pub model: String,
    pub stream: bool,
    pub tools_enabled: bool,
    pub max_tool_rounds: usize,
    pub request_timeout: Duration,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    /// Directory tool paths are relative to.
    pub working_dir: PathBuf,
    pub control_tokens: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let ollama_host = file
            .ollama_host
            .unwrap_or_else(|| cli.ollama_host.clone());
        if ollama_host.trim().is_empty() {
            bail!("ollama_host must not be empty");
        }

        let model = file.model.unwrap_or_else(|| cli.model.clone());
        if model.trim().is_empty() {
            bail!("model must not be empty");
        }

        let stream = file.stream.unwrap_or(cli.stream);
        let tools_enabled = file.tools_enabled.unwrap_or(cli.tools_enabled);

        let max_tool_rounds = file.max_tool_rounds.unwrap_or(cli.max_tool_rounds);
        if max_tool_rounds == 0 {
            bail!("max_tool_rounds must be at least 1");
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(cli.request_timeout_secs);
        if request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }

        if let Some(temperature) = file.temperature {
            if !temperature.is_finite() || temperature < 0.0 {
                bail!("temperature must be a non-negative number, got {}", temperature);
            }
        }

        let working_dir = match file.working_dir.map(PathBuf::from).or_else(|| cli.working_dir.clone()) {
            Some(dir) => dir,
            None => std::env::current_dir().context("Could not determine current directory")?,
        };
        if !working_dir.exists() {
            bail!("Working directory does not exist: {:?}", working_dir);
        }
        if !working_dir.is_dir() {
            bail!("working_dir is not a directory: {:?}", working_dir);
        }

        let control_tokens = file.control_tokens.unwrap_or_else(default_control_tokens);

        Ok(Self {
            ollama_host: normalize_host(&ollama_host),
            model,
            stream,
            tools_enabled,
            max_tool_rounds,
            request_timeout: Duration::from_secs(request_timeout_secs),
            temperature: file.temperature,
            system_prompt: file.system_prompt.filter(|p| !p.trim().is_empty()),
            working_dir,
            control_tokens,
        })
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            stream: self.stream,
            temperature: self.temperature,
            timeout: self.request_timeout,
        }
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            max_tool_rounds: self.max_tool_rounds,
            control_tokens: self.control_tokens.clone(),
            completion_options: self.completion_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_in(dir: &TempDir) -> CliConfig {
        CliConfig {
            working_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_in(&temp_dir), None).unwrap();

        assert_eq!(config.ollama_host, "http://localhost:11435");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.stream);
        assert!(config.tools_enabled);
        assert_eq!(config.max_tool_rounds, 25);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.temperature.is_none());
        assert!(config.system_prompt.is_none());
        assert_eq!(config.working_dir, temp_dir.path());
        assert_eq!(config.control_tokens, default_control_tokens());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            ollama_host: "http://gpu:11434/".to_string(),
            model: "llama3.1:8b".to_string(),
            stream: false,
            tools_enabled: false,
            max_tool_rounds: 3,
            request_timeout_secs: 30,
            working_dir: Some(temp_dir.path().to_path_buf()),
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.ollama_host, "http://gpu:11434");
        assert_eq!(config.model, "llama3.1:8b");
        assert!(!config.stream);
        assert!(!config.tools_enabled);
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            ollama_host: "cli-host:1".to_string(),
            max_tool_rounds: 4,
            working_dir: Some(PathBuf::from("/should/be/overridden")),
            ..Default::default()
        };

        let file_config = FileConfig {
            ollama_host: Some("toml-host:2".to_string()),
            stream: Some(false),
            temperature: Some(0.1),
            system_prompt: Some("Be terse.".to_string()),
            working_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            control_tokens: Some(vec!["<|eot_id|>".to_string()]),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.ollama_host, "http://toml-host:2");
        assert!(!config.stream);
        assert_eq!(config.temperature, Some(0.1));
        assert_eq!(config.system_prompt.as_deref(), Some("Be terse."));
        assert_eq!(config.working_dir, temp_dir.path());
        assert_eq!(config.control_tokens, vec!["<|eot_id|>".to_string()]);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.max_tool_rounds, 4);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_resolve_zero_rounds_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            max_tool_rounds: 0,
            ..cli_in(&temp_dir)
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("max_tool_rounds must be at least 1"));
    }

    #[test]
    fn test_resolve_nonexistent_working_dir_error() {
        let cli = CliConfig {
            working_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_working_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            working_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_rejects_negative_temperature() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            temperature: Some(-1.0),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_in(&temp_dir), Some(file_config)).is_err());
    }

    #[test]
    fn test_blank_system_prompt_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            system_prompt: Some("   ".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli_in(&temp_dir), Some(file_config)).unwrap();
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn test_agent_settings_carry_options() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            stream: false,
            max_tool_rounds: 7,
            request_timeout_secs: 12,
            ..cli_in(&temp_dir)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        let settings = config.agent_settings();

        assert_eq!(settings.max_tool_rounds, 7);
        assert!(!settings.completion_options.stream);
        assert_eq!(settings.completion_options.timeout, Duration::from_secs(12));
    }
}
