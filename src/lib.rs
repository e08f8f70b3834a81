#![warn(missing_docs)]

//! `bqsql_lib` is the library powering the `bqsql-cli` application.
//!
//! It provides the components for:
//! - Configuration management (`config`)
//! - Fetching BigQuery table metadata (`bigquery`)
//! - Splitting metadata documents into chunks (`splitter`)
//! - Generating embeddings via the OpenAI API (`embedding`)
//! - Interacting with the Qdrant vector store (`store`, `qdrant_client_trait`)
//! - Indexing dataset metadata (`indexing`)
//! - Retrieving candidate tables for a question (`retrieval`)
//! - Turning a question plus schemas into SQL (`sqlgen`)
//! - Error handling (`error`)
//!
//! ## Overview
//!
//! The library orchestrates two flows. Indexing serializes each table's
//! metadata to JSON, chunks it, embeds the chunks and stores them in Qdrant
//! with the table identity in the payload. Querying embeds the question,
//! finds the nearest chunks, deduplicates them into candidate tables,
//! re-fetches those tables' schemas and prompts a chat model to write a
//! single SQL statement against them.

/// BigQuery metadata types and REST client.
pub mod bigquery;
/// Command-line interface structure and handlers.
pub mod cli;
/// Configuration management for the application.
pub mod config;
/// Shared constants used across the library.
pub mod constants;
/// Embedding generation via the OpenAI API.
pub mod embedding;
/// Defines the core error types and Result alias.
pub mod error;
/// Trait defining the interface for a Qdrant client, enabling mocking.
pub mod qdrant_client_trait;
/// Core logic for indexing dataset metadata.
pub mod indexing;
/// Top-K candidate table retrieval.
pub mod retrieval;
/// Document preparation and text splitting.
pub mod splitter;
/// Prompt construction, chat completion and SQL extraction.
pub mod sqlgen;
/// Qdrant collection bootstrap and point operations.
pub mod store;

pub use bigquery::{BigQueryClient, TableIdentifier, TableMetadata, TableSchemaField};
pub use config::{load_config, save_config, AppConfig};
pub use embedding::{EmbeddingProvider, OpenAiEmbedder};
pub use error::{BqSqlError, Result};
pub use qdrant_client_trait::QdrantClientTrait;
pub use constants::*;
pub use indexing::{index_dataset, index_tables};
pub use retrieval::{decide_tables, TableCandidate};
pub use splitter::{InputText, TextSplitter};
pub use sqlgen::{answer_question, clean_sql_output, ChatModel, OpenAiChatModel, SqlGeneration};
pub use store::{count_points, delete_all, ensure_collection, upsert_batch};
