//! chatwheel - terminal chat client binary.

use std::process::ExitCode;

use chatwheel::{ChatClient, ClientConfig, ModelCatalog, TerminalSink, COMMAND_HELP};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Streaming chat client for a WebSocket LLM backend
#[derive(Parser)]
#[command(name = "chatwheel")]
#[command(about = "Chat with a streaming LLM backend from the terminal")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Server base URL (overrides config and environment)
    #[arg(short, long)]
    server: Option<String>,

    /// Model id to select at startup
    #[arg(short, long)]
    model: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level);

    let mut config = if let Some(config_path) = &args.config {
        match ClientConfig::load(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config from {}: {}", config_path, e);
                eprintln!("chatwheel: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        ClientConfig::default()
    };
    config.apply_env();
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(model) = args.model {
        config.model = Some(model);
    }
    if let Err(e) = config.validate() {
        eprintln!("chatwheel: {e}");
        return ExitCode::FAILURE;
    }

    let mut client = match ChatClient::new(&config, TerminalSink::stdout()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to start client: {}", e);
            eprintln!("chatwheel: {e}");
            return ExitCode::FAILURE;
        }
    };

    let controller = client.controller_mut();
    match ModelCatalog::fetch(&config.models_url(), config.catalog_timeout()) {
        Ok(catalog) => controller.load_catalog(catalog, config.model.as_deref()),
        Err(e) => controller.catalog_unavailable(&e),
    }
    println!("{COMMAND_HELP}");

    info!("Starting chat session with {}", config.server_url);
    client.attach_stdin();
    client.run();

    ExitCode::SUCCESS
}
