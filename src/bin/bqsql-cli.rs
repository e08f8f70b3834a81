use anyhow::{Context, Result};
use clap::Parser;
use std::process::exit;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bqsql_lib::cli::{handle_command, CliArgs, LogFormat};
use bqsql_lib::config;
use qdrant_client::Qdrant;

fn init_tracing(args: &CliArgs) {
    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match args.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args);

    let config = config::load_config(args.config.as_ref())
        .context("Failed to load configuration")?;

    tracing::info!("Using Qdrant URL from config: {}", config.qdrant_url);

    tracing::debug!("Initializing Qdrant client...");
    let client: Arc<Qdrant> = match Qdrant::from_url(&config.qdrant_url).build() {
        Ok(client_instance) => {
            tracing::debug!("Qdrant client initialized successfully.");
            Arc::new(client_instance)
        }
        Err(e) => {
            tracing::error!("Failed to initialize Qdrant client: {}", e);
            eprintln!("Error initializing Qdrant client: {}", e);
            eprintln!(
                "Please check the Qdrant URL in config ({}) and ensure the server is running.",
                config.qdrant_url
            );
            exit(1);
        }
    };

    if let Err(e) = handle_command(args, &config, client).await {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        exit(1);
    }

    Ok(())
}
