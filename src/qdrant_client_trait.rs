//! Trait over the Qdrant operations this tool uses, enabling mocking in tests.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPoints, CountResponse, CreateCollection, DeleteCollection, Distance, PointsOperationResponse,
    QueryPoints, QueryResponse, UpsertPoints, VectorParamsBuilder,
};
use qdrant_client::Qdrant;

use crate::error::{BqSqlError, Result};

/// The subset of the Qdrant client surface the application depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QdrantClientTrait: Send + Sync {
    /// Checks whether a collection exists.
    async fn collection_exists(&self, collection_name: String) -> Result<bool>;
    /// Creates a collection with a single dense cosine vector of `vector_dimension`.
    async fn create_collection(&self, collection_name: &str, vector_dimension: u64) -> Result<bool>;
    /// Upserts a batch of points.
    async fn upsert_points(&self, request: UpsertPoints) -> Result<PointsOperationResponse>;
    /// Runs a query (nearest-neighbor search) request.
    async fn query(&self, request: QueryPoints) -> Result<QueryResponse>;
    /// Deletes a collection, returning whether it existed.
    async fn delete_collection(&self, collection_name: String) -> Result<bool>;
    /// Counts the points in a collection.
    async fn count(&self, request: CountPoints) -> Result<CountResponse>;
}

#[async_trait]
impl QdrantClientTrait for Qdrant {
    async fn collection_exists(&self, collection_name: String) -> Result<bool> {
        self.collection_exists(collection_name)
            .await
            .map_err(BqSqlError::QdrantError)
    }

    async fn create_collection(&self, collection_name: &str, vector_dimension: u64) -> Result<bool> {
        let vector_params = VectorParamsBuilder::new(vector_dimension, Distance::Cosine).build();

        let request = CreateCollection {
            collection_name: collection_name.to_string(),
            vectors_config: Some(vector_params.into()),
            ..Default::default()
        };

        let response = self
            .create_collection(request)
            .await
            .map_err(BqSqlError::QdrantError)?;
        Ok(response.result)
    }

    async fn upsert_points(&self, request: UpsertPoints) -> Result<PointsOperationResponse> {
        self.upsert_points(request).await.map_err(BqSqlError::QdrantError)
    }

    async fn query(&self, request: QueryPoints) -> Result<QueryResponse> {
        self.query(request).await.map_err(BqSqlError::QdrantError)
    }

    async fn delete_collection(&self, collection_name: String) -> Result<bool> {
        let request = DeleteCollection {
            collection_name,
            ..Default::default()
        };
        Ok(self
            .delete_collection(request)
            .await
            .map_err(BqSqlError::QdrantError)?
            .result)
    }

    async fn count(&self, request: CountPoints) -> Result<CountResponse> {
        self.count(request).await.map_err(BqSqlError::QdrantError)
    }
}
