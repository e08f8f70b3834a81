//! Core logic for loading BigQuery table metadata into the vector store.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::bigquery::{BigQueryClient, TableMetadata};
use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::qdrant_client_trait::QdrantClientTrait;
use crate::splitter::{InputText, TextSplitter};
use crate::store::{build_points, ensure_collection, upsert_batch};

/// Fetches all tables of one dataset, chunks and embeds their metadata, and
/// upserts the resulting points.
///
/// A table whose document cannot be embedded is skipped with a warning; the
/// rest of the run continues. Returns `(tables_indexed, points_stored)`.
pub async fn index_dataset<C>(
    client: Arc<C>,
    bigquery: &BigQueryClient,
    embedder: &dyn EmbeddingProvider,
    config: &AppConfig,
    project_id: &str,
    dataset_id: &str,
) -> Result<(usize, usize)>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    let tables = bigquery.list_dataset_tables(project_id, dataset_id).await?;
    if tables.is_empty() {
        tracing::info!("Dataset {}.{} has no tables, nothing to index", project_id, dataset_id);
        return Ok((0, 0));
    }
    index_tables(client, embedder, config, &tables).await
}

/// Chunks, embeds and upserts a set of already-fetched table metadata.
pub async fn index_tables<C>(
    client: Arc<C>,
    embedder: &dyn EmbeddingProvider,
    config: &AppConfig,
    tables: &[TableMetadata],
) -> Result<(usize, usize)>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    let collection_name = config.collection_name.as_str();
    ensure_collection(client.clone(), collection_name, embedder.dimension()).await?;

    let splitter = TextSplitter::from_config(&config.chunking);
    let batch_size = config.performance.batch_size.max(1);

    let progress = ProgressBar::new(tables.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tables ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut tables_indexed = 0usize;
    let mut points_stored = 0usize;
    let mut points_batch = Vec::with_capacity(batch_size);

    for table in tables {
        progress.set_message(table.id.clone());

        let document = match InputText::from_table_metadata(table) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Skipping table {}: failed to build document: {}", table.id, e);
                progress.inc(1);
                continue;
            }
        };

        let chunks = splitter.split(&document.text);
        if chunks.is_empty() {
            tracing::debug!("No chunks produced for table {}", table.id);
            progress.inc(1);
            continue;
        }

        let vectors = match embedder.embed(&chunks).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Skipping table {} due to embedding error: {}", table.id, e);
                progress.inc(1);
                continue;
            }
        };

        let points = build_points(&document, &chunks, vectors);
        points_stored += points.len();
        points_batch.extend(points);
        tables_indexed += 1;

        if points_batch.len() >= batch_size {
            upsert_batch(client.clone(), collection_name, std::mem::take(&mut points_batch)).await?;
            points_batch = Vec::with_capacity(batch_size);
        }

        progress.inc(1);
    }

    if !points_batch.is_empty() {
        upsert_batch(client.clone(), collection_name, points_batch).await?;
    }

    progress.finish_with_message(format!(
        "Indexed {} tables ({} points)",
        tables_indexed, points_stored
    ));

    tracing::info!(
        "Finished indexing {} tables, {} points stored into collection \"{}\"",
        tables_indexed,
        points_stored,
        collection_name
    );

    Ok((tables_indexed, points_stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigquery::TableSchemaField;
    use crate::embedding::MockEmbeddingProvider;
    use crate::error::BqSqlError;
    use crate::qdrant_client_trait::MockQdrantClientTrait;
    use qdrant_client::qdrant::PointsOperationResponse;

    fn table(table_id: &str) -> TableMetadata {
        TableMetadata {
            id: format!("p.d.{}", table_id),
            project_id: "p".to_string(),
            dataset_id: "d".to_string(),
            table_id: table_id.to_string(),
            description: None,
            schema: vec![TableSchemaField {
                name: "amount".to_string(),
                field_type: "NUMERIC".to_string(),
            }],
        }
    }

    fn embedder_failing_on(marker: &'static str) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_dimension().return_const(4u64);
        embedder.expect_embed().returning(move |texts| {
            if texts.iter().any(|t| t.contains(marker)) {
                Err(BqSqlError::EmbeddingError("simulated API failure".to_string()))
            } else {
                Ok(texts.iter().map(|_| vec![0.1_f32; 4]).collect())
            }
        });
        embedder
    }

    #[tokio::test]
    async fn test_index_tables_skips_failed_embeddings() {
        let mut qdrant = MockQdrantClientTrait::new();
        qdrant.expect_collection_exists().returning(|_| Ok(true));
        qdrant.expect_create_collection().times(0);
        qdrant
            .expect_upsert_points()
            .times(1)
            .returning(|_| Ok(PointsOperationResponse::default()));

        let embedder = embedder_failing_on("unembeddable");
        let config = AppConfig::default();
        let tables = vec![table("orders"), table("unembeddable"), table("users")];

        let (tables_indexed, points_stored) =
            index_tables(Arc::new(qdrant), &embedder, &config, &tables)
                .await
                .unwrap();

        // The failing table is skipped, the rest of the run continues
        assert_eq!(tables_indexed, 2);
        assert_eq!(points_stored, 2);
    }

    #[tokio::test]
    async fn test_index_tables_counts_all_points() {
        let mut qdrant = MockQdrantClientTrait::new();
        qdrant.expect_collection_exists().returning(|_| Ok(false));
        qdrant
            .expect_create_collection()
            .withf(|name, dim| name == "bigquery_metadata" && *dim == 4)
            .returning(|_, _| Ok(true));
        qdrant
            .expect_upsert_points()
            .returning(|_| Ok(PointsOperationResponse::default()));

        let embedder = embedder_failing_on("\u{0}never matches");
        let config = AppConfig::default();
        let tables = vec![table("orders"), table("users")];

        let (tables_indexed, points_stored) =
            index_tables(Arc::new(qdrant), &embedder, &config, &tables)
                .await
                .unwrap();

        // Each table's metadata JSON is short enough for a single chunk
        assert_eq!(tables_indexed, 2);
        assert_eq!(points_stored, 2);
    }
}
