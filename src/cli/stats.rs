use anyhow::Result;
use qdrant_client::Qdrant;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::qdrant_client_trait::QdrantClientTrait;
use crate::store::count_points;

/// Handles the `stats` command.
pub async fn handle_stats(config: &AppConfig, client: Arc<Qdrant>) -> Result<()> {
    let collection_name = &config.collection_name;

    if !QdrantClientTrait::collection_exists(client.as_ref(), collection_name.clone()).await? {
        println!(
            "Collection '{}' does not exist yet. Run `index` first.",
            collection_name
        );
        return Ok(());
    }

    let points = count_points(client, collection_name).await?;
    println!("Collection: {}", collection_name);
    println!("Indexed points: {}", points);
    println!("Qdrant URL: {}", config.qdrant_url);
    println!("Embedding model: {}", config.openai.embedding_model);
    println!("Vector dimension: {}", config.performance.vector_dimension);
    Ok(())
}
