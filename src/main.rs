//! pgchat - chat with your PostgreSQL database in natural language.

use std::sync::Arc;

use pgchat::app::Orchestrator;
use pgchat::cli::Cli;
use pgchat::config::{Config, ConnectionOverrides};
use pgchat::connection::ConnectionFactory;
use pgchat::db::{Connector, MockConnector, PostgresConnector};
use pgchat::error::{ChatError, Result};
use pgchat::headless::{self, HeadlessConfig, HeadlessRunner};
use pgchat::{llm, logging, tui};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.headless {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Builds every component and runs the selected mode. Returns the exit code.
async fn run(cli: Cli) -> Result<i32> {
    cli.validate_headless().map_err(ChatError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    let provider = cli.llm_provider(&config).map_err(ChatError::config)?;
    let llm = llm::create_client(provider, &config.llm, None)?;
    info!("LLM provider: {}", provider.as_str());

    // Precedence: CLI > environment > config file > defaults.
    let connection = config
        .connection
        .clone()
        .merge(ConnectionOverrides::from_env())
        .merge(cli.connection_overrides())
        .resolve();
    info!("Connection: {}", connection.display_string());

    let connector: Arc<dyn Connector> = if cli.mock_db {
        info!("Using mock database");
        Arc::new(MockConnector::new())
    } else {
        Arc::new(PostgresConnector)
    };
    let factory = Arc::new(ConnectionFactory::new(connector, config.cache.ttl()));
    let orchestrator = Orchestrator::new(factory, llm, connection, config.agent.clone());

    if cli.headless {
        run_headless(&cli, orchestrator).await
    } else {
        tui::run(orchestrator).await?;
        Ok(0)
    }
}

async fn run_headless(cli: &Cli, orchestrator: Orchestrator) -> Result<i32> {
    let settings = HeadlessConfig {
        format: cli.parse_output_format().map_err(ChatError::config)?,
        output_file: cli.output_file.clone(),
    };

    let mut inputs = match &cli.script {
        Some(source) => headless::read_script(source)?,
        None => Vec::new(),
    };
    inputs.extend(cli.ask.iter().cloned());

    let report = HeadlessRunner::new(orchestrator).run(inputs).await?;
    let output = report.format(settings.format)?;
    headless::write_output(&output, settings.output_file.as_deref())?;

    Ok(if report.failures > 0 { 1 } else { 0 })
}
