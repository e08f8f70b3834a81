use anyhow::{Context, Result};
use clap::Args;
use qdrant_client::Qdrant;
use std::sync::Arc;

use crate::bigquery::BigQueryClient;
use crate::config::AppConfig;
use crate::embedding::OpenAiEmbedder;
use crate::sqlgen::{answer_question, OpenAiChatModel};

use super::formatters::print_sql_generation;

/// Arguments for the `query` command.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// The natural-language question
    #[arg(required = true)]
    pub question: String,

    /// Maximum number of candidate chunks to retrieve (defaults to config top_k)
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Also print the candidate tables and their scores
    #[arg(long)]
    pub show_tables: bool,
}

/// Handles the `query` command.
pub async fn handle_query(args: &QueryArgs, config: &AppConfig, client: Arc<Qdrant>) -> Result<()> {
    let top_k = args.limit.unwrap_or(config.query.top_k);
    tracing::info!("Answering question with top_k={}", top_k);

    let bigquery = BigQueryClient::from_env(config.openai.request_timeout_secs)
        .context("Failed to create BigQuery client")?;
    let embedder = OpenAiEmbedder::from_env(&config.openai, &config.performance)
        .context("Failed to create embedding client")?;
    let chat = OpenAiChatModel::from_env(&config.openai)
        .context("Failed to create chat model client")?;

    let generation = answer_question(
        client,
        &bigquery,
        &embedder,
        &chat,
        config,
        &args.question,
        top_k,
    )
    .await?;

    print_sql_generation(&generation, args.show_tables);
    Ok(())
}
