use std::io;
use thiserror::Error;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, BqSqlError>;

/// Errors that can occur while indexing or querying table metadata
#[derive(Error, Debug)]
pub enum BqSqlError {
    /// Invalid or unusable configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The BigQuery REST API rejected or failed a request.
    #[error("BigQuery API error: {0}")]
    BigQueryError(String),

    /// The embeddings API failed or returned an unusable response.
    #[error("Error generating embedding: {0}")]
    EmbeddingError(String),

    /// The chat completion API failed or returned an unusable response.
    #[error("Language model error: {0}")]
    LlmError(String),

    /// A vector store operation failed.
    #[error("Vector store error: {0}")]
    StoreError(String),

    /// The metadata collection has not been indexed yet.
    #[error("Collection '{0}' does not exist. Run `index` first.")]
    CollectionNotFound(String),

    /// A required credential environment variable is missing.
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    /// A caller-supplied parameter failed validation.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from the Qdrant client.
    #[error("Qdrant error: {0}")]
    QdrantError(#[from] qdrant_client::QdrantError),

    /// Error from the HTTP client.
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    #[error("Error serializing or deserializing data: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Filesystem IO error.
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
}
