//! Command-line argument parsing for pgchat.

use crate::config::{Config, ConnectionOverrides};
use crate::headless::OutputFormat;
use crate::llm::LlmProvider;
use clap::Parser;
use std::path::PathBuf;

/// Chat with your PostgreSQL database in natural language.
#[derive(Parser, Debug)]
#[command(name = "pgchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database host
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Database name
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Database password (prefer the PGPASSWORD environment variable)
    #[arg(long, env = "PGPASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider: openai or mock (overrides the config file)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Model name (overrides the config file)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Use the in-memory mock database instead of PostgreSQL
    #[arg(long)]
    pub mock_db: bool,

    // === Headless mode options ===
    /// Run without the terminal UI
    #[arg(long)]
    pub headless: bool,

    /// Script with one input per line (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Question or command to run; may be repeated
    #[arg(long, value_name = "INPUT")]
    pub ask: Vec<String>,

    /// Output format for headless mode: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write headless output to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Connection values given on the command line (and `PGPASSWORD`).
    pub fn connection_overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            host: self.host.clone(),
            port: self.port.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }

    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Provider from --llm, falling back to the config file.
    pub fn llm_provider(&self, config: &Config) -> std::result::Result<LlmProvider, String> {
        self.llm
            .as_deref()
            .unwrap_or(config.llm.provider.as_str())
            .parse()
    }

    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    pub fn validate_headless(&self) -> std::result::Result<(), String> {
        if !self.headless {
            if self.script.is_some() || !self.ask.is_empty() {
                return Err("--script and --ask require --headless".to_string());
            }
            return Ok(());
        }

        if self.script.is_none() && self.ask.is_empty() {
            return Err("--headless requires --script or --ask".to_string());
        }

        self.parse_output_format()?;
        Ok(())
    }
}
