//! Embedding generation via the OpenAI embeddings API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{OpenAiConfig, PerformanceConfig};
use crate::constants::OPENAI_API_KEY_ENV;
use crate::error::{BqSqlError, Result};

/// Produces dense vectors for texts. Implemented by the OpenAI client and
/// mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts, one vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    /// Dimension of the vectors this provider returns.
    fn dimension(&self) -> u64;
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Deserialize)]
struct EmbeddingObject {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding client against an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    batch_size: usize,
    dimension: u64,
}

impl OpenAiEmbedder {
    /// Builds an embedder from config, with the API key from `OPENAI_API_KEY`.
    pub fn from_env(openai: &OpenAiConfig, performance: &PerformanceConfig) -> Result<Self> {
        let api_key = std::env::var(OPENAI_API_KEY_ENV)
            .map_err(|_| BqSqlError::MissingCredential(OPENAI_API_KEY_ENV.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(openai.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: openai.api_base_url.clone(),
            api_key,
            model: openai.embedding_model.clone(),
            batch_size: performance.embed_batch_size.max(1),
            dimension: performance.vector_dimension,
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest { model: &self.model, input: batch };
        let response = self
            .http
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(BqSqlError::EmbeddingError(format!(
                "embeddings API returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response.json().await?;
        if parsed.data.len() != batch.len() {
            return Err(BqSqlError::EmbeddingError(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }

        // The API reports an index per vector; restore input order.
        let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); batch.len()];
        for object in parsed.data {
            if object.index >= batch.len() {
                return Err(BqSqlError::EmbeddingError(format!(
                    "embedding index {} out of range",
                    object.index
                )));
            }
            vectors[object.index] = object.embedding;
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            tracing::debug!("Embedding batch of {} texts", batch.len());
            all.extend(self.embed_batch(batch).await?);
        }
        Ok(all)
    }

    fn dimension(&self) -> u64 {
        self.dimension
    }
}
