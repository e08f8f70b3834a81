use anyhow::{Context, Result};
use clap::Args;
use qdrant_client::Qdrant;
use std::sync::Arc;

use crate::bigquery::BigQueryClient;
use crate::config::AppConfig;
use crate::embedding::OpenAiEmbedder;
use crate::indexing::index_dataset;

/// Arguments for the `index` command.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Project ID (e.g. 'my_project')
    #[arg(long)]
    pub project_id: String,

    /// Dataset ID (e.g. 'my_dataset')
    #[arg(long)]
    pub dataset_id: String,
}

/// Handles the `index` command.
pub async fn handle_index(args: &IndexArgs, config: &AppConfig, client: Arc<Qdrant>) -> Result<()> {
    tracing::info!(
        "Loading metadata from BigQuery dataset {}.{}...",
        args.project_id,
        args.dataset_id
    );

    let bigquery = BigQueryClient::from_env(config.openai.request_timeout_secs)
        .context("Failed to create BigQuery client")?;
    let embedder = OpenAiEmbedder::from_env(&config.openai, &config.performance)
        .context("Failed to create embedding client")?;

    let (tables, points) = index_dataset(
        client,
        &bigquery,
        &embedder,
        config,
        &args.project_id,
        &args.dataset_id,
    )
    .await?;

    if tables == 0 {
        println!(
            "No tables found in dataset {}.{}.",
            args.project_id, args.dataset_id
        );
    } else {
        println!(
            "Indexed {} tables ({} points) into collection '{}'.",
            tables, points, config.collection_name
        );
    }
    Ok(())
}
