//! Nearest-neighbor retrieval of candidate tables for a question.

use qdrant_client::qdrant::{Query, QueryPointsBuilder, ScoredPoint};
use std::collections::HashSet;
use std::sync::Arc;

use crate::bigquery::{BigQueryClient, TableIdentifier, TableMetadata};
use crate::constants::{FIELD_DATASET_ID, FIELD_ID, FIELD_PROJECT_ID, FIELD_TABLE_ID};
use crate::embedding::EmbeddingProvider;
use crate::error::{BqSqlError, Result};
use crate::qdrant_client_trait::QdrantClientTrait;

/// One candidate table with the best similarity score among its chunks.
#[derive(Debug, Clone)]
pub struct TableCandidate {
    /// Fully qualified table name.
    pub id: String,
    /// Identifier used to re-fetch fresh metadata.
    pub identifier: TableIdentifier,
    /// Similarity score of the best-matching chunk.
    pub score: f32,
}

/// Extracts unique table candidates from search hits, preserving the
/// descending-score order Qdrant returns. Hits with a missing or incomplete
/// payload are skipped with a warning.
pub fn unique_table_candidates(points: &[ScoredPoint]) -> Vec<TableCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for point in points {
        let payload = &point.payload;
        let id = payload.get(FIELD_ID).and_then(|v| v.as_str());
        let project_id = payload.get(FIELD_PROJECT_ID).and_then(|v| v.as_str());
        let dataset_id = payload.get(FIELD_DATASET_ID).and_then(|v| v.as_str());
        let table_id = payload.get(FIELD_TABLE_ID).and_then(|v| v.as_str());

        let (id, project_id, dataset_id, table_id) = match (id, project_id, dataset_id, table_id) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => {
                tracing::warn!("Search hit {:?} has an incomplete payload, skipping", point.id);
                continue;
            }
        };

        if !seen.insert(id.to_string()) {
            continue;
        }
        candidates.push(TableCandidate {
            id: id.to_string(),
            identifier: TableIdentifier {
                project_id: project_id.to_string(),
                dataset_id: dataset_id.to_string(),
                table_id: table_id.to_string(),
            },
            score: point.score,
        });
    }
    candidates
}

/// Finds the top-K candidate tables for a question and re-fetches their
/// current metadata from BigQuery.
///
/// The stored chunks may each hold only part of a schema, so the prompt is
/// built from freshly fetched whole-table metadata rather than chunk text.
pub async fn decide_tables<C>(
    client: Arc<C>,
    bigquery: &BigQueryClient,
    embedder: &dyn EmbeddingProvider,
    collection_name: &str,
    question: &str,
    top_k: u64,
) -> Result<Vec<(TableCandidate, TableMetadata)>>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    if !client.collection_exists(collection_name.to_string()).await? {
        return Err(BqSqlError::CollectionNotFound(collection_name.to_string()));
    }

    let question_vector = embedder
        .embed(std::slice::from_ref(&question.to_string()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            BqSqlError::EmbeddingError("Failed to generate embedding for the question".to_string())
        })?;

    let request = QueryPointsBuilder::new(collection_name)
        .query(Query::new_nearest(question_vector))
        .limit(top_k)
        .with_payload(true);
    let response = client.query(request.into()).await?;

    let candidates = unique_table_candidates(&response.result);
    if candidates.is_empty() {
        return Err(BqSqlError::StoreError(format!(
            "No candidate tables found in collection '{}' for the question",
            collection_name
        )));
    }

    tracing::info!(
        "Using the following tables: {:?}",
        candidates.iter().map(|c| c.id.as_str()).collect::<Vec<_>>()
    );

    let mut results = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let metadata = bigquery.get_table_metadata(&candidate.identifier).await?;
        results.push((candidate, metadata));
    }
    Ok(results)
}
