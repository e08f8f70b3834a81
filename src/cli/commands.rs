use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use qdrant_client::Qdrant;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;

/// Output format for log lines.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console output.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Top-level command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the config file (overrides the default location)
    #[arg(short, long, global = true, env = "BQSQL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

/// All supported subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load table metadata of a BigQuery dataset into the vector store
    Index(super::index::IndexArgs),

    /// Answer a natural-language question with a SQL query
    Query(super::query::QueryArgs),

    /// Show vector store statistics
    Stats,

    /// Delete the indexed metadata collection
    Clear,
}

/// Parses the command-line arguments and dispatches to the appropriate command handler.
///
/// # Arguments
/// * `args` - The parsed top-level command line arguments ([`CliArgs`]).
/// * `config` - The loaded application configuration ([`AppConfig`]).
/// * `client` - An Arc-wrapped Qdrant client instance.
pub async fn handle_command(args: CliArgs, config: &AppConfig, client: Arc<Qdrant>) -> Result<()> {
    match &args.command {
        Commands::Index(index_args) => super::index::handle_index(index_args, config, client).await,
        Commands::Query(query_args) => super::query::handle_query(query_args, config, client).await,
        Commands::Stats => super::stats::handle_stats(config, client).await,
        Commands::Clear => super::clear::handle_clear(config, client).await,
    }
}
