use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ollama_agent::agent::{
    Agent, AgentToolRegistry, Conversation, LlmProvider, OllamaProvider, ToolContext,
};
use ollama_agent::cli_style::{get_styles, print_banner, print_error, print_warning};
use ollama_agent::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use ollama_agent::console::{ReadlineInput, TerminalOutput};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(
    styles = get_styles(),
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Chat with a local Ollama model that can read, list and edit files."
)]
struct CliArgs {
    /// Ollama server, as `host:port` or a full URL.
    #[clap(long, env = "OLLAMA_HOST", default_value = DEFAULT_OLLAMA_HOST)]
    pub ollama_host: String,

    /// Model to chat with.
    #[clap(long, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Request whole responses instead of streamed fragments.
    #[clap(long)]
    pub no_stream: bool,

    /// Do not offer any tools to the model.
    #[clap(long)]
    pub no_tools: bool,

    /// Maximum inference rounds per user turn.
    #[clap(long, default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    pub max_tool_rounds: usize,

    /// Timeout in seconds for each inference request.
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Directory tool paths are resolved against. Defaults to the current directory.
    #[clap(long, value_parser = parse_path)]
    pub workdir: Option<PathBuf>,

    /// Path to a TOML config file. Values in it override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            ollama_host: self.ollama_host.clone(),
            model: self.model.clone(),
            stream: !self.no_stream,
            tools_enabled: !self.no_tools,
            max_tool_rounds: self.max_tool_rounds,
            request_timeout_secs: self.request_timeout_secs,
            working_dir: self.workdir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // Logs go to stderr so they never interleave with the chat on stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!(
        host = %config.ollama_host,
        model = %config.model,
        stream = config.stream,
        tools = config.tools_enabled,
        "Starting session"
    );

    let provider = Arc::new(OllamaProvider::new(&config.ollama_host, config.model.clone()));
    if let Err(e) = provider.health_check().await {
        print_warning(&format!(
            "Ollama at {} is not reachable yet: {}",
            provider.base_url(),
            e
        ));
    }

    let registry = if config.tools_enabled {
        AgentToolRegistry::builtin()
    } else {
        AgentToolRegistry::new()
    };
    let tool_names = registry
        .definitions()
        .into_iter()
        .map(|d| d.name)
        .collect::<Vec<_>>();

    let agent = Agent::new(
        provider,
        Arc::new(registry),
        ToolContext::new(config.working_dir.clone()),
    )
    .with_settings(config.agent_settings());

    let mut conversation = match &config.system_prompt {
        Some(prompt) => Conversation::with_system_prompt(prompt.clone()),
        None => Conversation::new(),
    };

    print_banner(&[
        ("model", config.model.clone()),
        ("host", config.ollama_host.clone()),
        ("workdir", config.working_dir.display().to_string()),
        (
            "tools",
            if tool_names.is_empty() {
                "none".to_string()
            } else {
                tool_names.join(", ")
            },
        ),
    ]);

    let mut input = ReadlineInput::new()?;
    let mut output = TerminalOutput::new();

    if let Err(e) = agent
        .run_session(&mut conversation, &mut input, &mut output)
        .await
    {
        println!();
        error!("Session ended: {}", e);
        print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
