//! CLI command definitions and handlers

mod analyze;
mod init;

use crate::config::{Overrides, DEFAULT_CONFIG_FILE};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// code-critique - AI-powered code review against a fixed rubric
#[derive(Parser, Debug)]
#[command(name = "code-critique")]
#[command(
    version,
    about = "AI-powered code critique: sends a service's source to an LLM and emits a validated JSON report plus an HTML view",
    long_about = "code-critique collects the source files of one service, asks a language model \
to review them against a fixed rubric (architecture, error handling, performance, \
AI quality, domain logic and optional scenario compliance) and writes \
code-critique-data.json and code-critique-report.html.\n\n\
Supported providers: anthropic, openai (and any OpenAI-compatible endpoint), ollama",
    after_help = "\
Examples:
  code-critique ./orders-service --provider anthropic       Review with Claude (needs ANTHROPIC_API_KEY)
  code-critique . --provider ollama --model qwen2.5-coder   Review locally with Ollama
  code-critique . --provider openai --scenarios test-scenarios.yml
  code-critique . --exclude-tests --confidence-threshold 85
  code-critique init                                         Write an example config.json"
)]
pub struct Cli {
    /// Service directory to review
    #[arg(env = "SERVICE_PATH", default_value = ".")]
    pub path: PathBuf,

    /// Provider: anthropic, openai, ollama
    #[arg(long, env = "AI_PROVIDER")]
    pub provider: Option<String>,

    /// Model name (default: provider's default)
    #[arg(long, env = "AI_MODEL")]
    pub model: Option<String>,

    /// Provider base URL
    #[arg(long, env = "AI_API_URL")]
    pub api_url: Option<String>,

    /// API key (else the provider's key variable, e.g. ANTHROPIC_API_KEY)
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Minimum confidence (0-100) the model needs to report an issue
    #[arg(long, env = "AI_CONFIDENCE_THRESHOLD")]
    pub confidence_threshold: Option<u32>,

    #[arg(long, env = "AI_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    #[arg(long, env = "AI_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Provider call timeout in seconds
    #[arg(long, env = "AI_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Test-scenario document validated as "Functional Compliance"
    #[arg(long, env = "TEST_SCENARIOS_PATH")]
    pub scenarios: Option<PathBuf>,

    /// Report folder name (default: target directory name)
    #[arg(long, env = "SERVICE_NAME")]
    pub service_name: Option<String>,

    /// JSON config file (default: ./config.json if present)
    #[arg(long, env = "CRITIQUE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reports go to <OUTPUT_DIR>/<service name>/
    #[arg(long, env = "CRITIQUE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON schema to check the report against (default: built-in)
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Skip test sources (test directories and *Test.java, test_*.py, *.spec.ts, ...)
    #[arg(long)]
    pub exclude_tests: bool,

    /// Suppress the progress ticker during the provider call
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example config.json (or the --config path)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// CLI/environment values for settings resolution
    pub fn overrides(&self) -> Overrides {
        Overrides {
            target: self.path.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            confidence_threshold: self.confidence_threshold,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
            scenarios: self.scenarios.clone(),
            service_name: self.service_name.clone(),
            output_dir: self.output_dir.clone(),
            schema: self.schema.clone(),
            exclude_tests: self.exclude_tests,
        }
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init { force }) => {
            let path = cli
                .config
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
            init::run(path, force)
        }
        None => analyze::run(&cli),
    }
}
