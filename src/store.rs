//! Qdrant collection bootstrap, point construction and batched upserts.

use qdrant_client::qdrant::{CountPoints, PointStruct, UpsertPointsBuilder};
use qdrant_client::Payload;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::FIELD_CHUNK_CONTENT;
use crate::error::Result;
use crate::qdrant_client_trait::QdrantClientTrait;
use crate::splitter::InputText;

/// Creates the collection if it does not exist yet.
///
/// Returns `true` if the collection was created by this call.
pub async fn ensure_collection<C>(
    client: Arc<C>,
    collection_name: &str,
    vector_dimension: u64,
) -> Result<bool>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    if client.collection_exists(collection_name.to_string()).await? {
        tracing::debug!("Collection '{}' already exists", collection_name);
        return Ok(false);
    }
    tracing::info!(
        "Creating collection '{}' (dimension {})",
        collection_name,
        vector_dimension
    );
    client.create_collection(collection_name, vector_dimension).await?;
    Ok(true)
}

/// Builds one point per chunk: uuid id, dense vector, document payload plus
/// the chunk text under `chunk_content`.
pub fn build_points(
    document: &InputText,
    chunks: &[String],
    vectors: Vec<Vec<f32>>,
) -> Vec<PointStruct> {
    chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| {
            let mut payload = Payload::new();
            for (key, value) in &document.metadata {
                payload.insert(key.as_str(), value.clone());
            }
            payload.insert(FIELD_CHUNK_CONTENT, chunk.clone());
            PointStruct::new(Uuid::new_v4().to_string(), vector, payload)
        })
        .collect()
}

/// Upserts a batch of points into a Qdrant collection.
pub async fn upsert_batch<C>(
    client: Arc<C>,
    collection_name: &str,
    points: Vec<PointStruct>,
) -> Result<()>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    if points.is_empty() {
        return Ok(());
    }
    tracing::debug!("Upserting batch of {} points to \"{}\"", points.len(), collection_name);

    let upsert_builder = UpsertPointsBuilder::new(collection_name, points);
    client.upsert_points(upsert_builder.into()).await?;
    Ok(())
}

/// Drops the collection entirely, returning whether it existed.
pub async fn delete_all<C>(client: Arc<C>, collection_name: &str) -> Result<bool>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    tracing::info!("Deleting collection: {}", collection_name);
    client.delete_collection(collection_name.to_string()).await
}

/// Returns the exact number of points stored in the collection.
pub async fn count_points<C>(client: Arc<C>, collection_name: &str) -> Result<u64>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    let request = CountPoints {
        collection_name: collection_name.to_string(),
        exact: Some(true),
        ..Default::default()
    };
    let response = client.count(request).await?;
    Ok(response.result.map(|r| r.count).unwrap_or(0))
}
