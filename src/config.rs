//!
//! Handles application configuration: Qdrant settings, OpenAI model names,
//! chunking and query defaults.
//! Configuration is typically loaded from a `config.toml` file.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::constants::DEFAULT_COLLECTION_NAME;

const APP_NAME: &str = "bqsql";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// OpenAI API settings shared by the embedder and the chat model.
pub struct OpenAiConfig {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Model used to embed table metadata and questions.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Chat model used to generate SQL.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Defaults applied when answering a question.
pub struct QueryConfig {
    /// Number of candidate chunks fetched from the vector store.
    #[serde(default = "default_top_k")]
    pub top_k: u64,
    /// SQL dialect named in the prompt.
    #[serde(default = "default_dialect")]
    pub dialect: String,
    /// Natural language the questions are written in.
    #[serde(default = "default_input_language")]
    pub input_language: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            dialect: default_dialect(),
            input_language: default_input_language(),
        }
    }
}

fn default_top_k() -> u64 {
    5
}

fn default_dialect() -> String {
    "bigquery".to_string()
}

fn default_input_language() -> String {
    "English".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Settings for splitting metadata documents into chunks.
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters carried over from the previous chunk.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Separator the text is split on before merging into chunks.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separator: default_separator(),
        }
    }
}

fn default_chunk_size() -> usize {
    3000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_separator() -> String {
    ",".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Configuration for performance-related settings
pub struct PerformanceConfig {
    /// Batch size for Qdrant upserts
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Batch size for embedding API requests
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
    /// Dimension of the embedding vectors
    #[serde(default = "default_vector_dimension")]
    pub vector_dimension: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            embed_batch_size: default_embed_batch_size(),
            vector_dimension: default_vector_dimension(),
        }
    }
}

fn default_batch_size() -> usize {
    64
}

fn default_embed_batch_size() -> usize {
    32
}

fn default_vector_dimension() -> u64 {
    1536
}

/// Main application configuration structure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// URL for the Qdrant instance.
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    /// Name of the collection holding the indexed table metadata.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Query-time defaults.
    #[serde(default)]
    pub query: QueryConfig,
    /// Chunking settings.
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Performance-related configuration settings
    #[serde(default)]
    pub performance: PerformanceConfig,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

fn default_collection_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection_name: default_collection_name(),
            openai: OpenAiConfig::default(),
            query: QueryConfig::default(),
            chunking: ChunkingConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

/// Returns the default path to the configuration file.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not find config directory"))?
        .join(APP_NAME);
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Gets the configuration path by checking ENV, override, or default XDG.
pub fn get_config_path_or_default(override_path: Option<&PathBuf>) -> Result<PathBuf> {
    // Check for test environment variable first
    if let Ok(test_path_str) = std::env::var("BQSQL_TEST_CONFIG_PATH") {
        tracing::debug!("Using test config path from ENV: {}", test_path_str);
        return Ok(PathBuf::from(test_path_str));
    }
    // Then check for direct override path
    if let Some(path) = override_path {
        tracing::debug!("Using override config path: {}", path.display());
        return Ok(path.clone());
    }
    // Otherwise, use default XDG path
    get_config_path()
}

/// Loads the application configuration from ENV, a specified path, or the default location.
///
/// If the configuration file or directory does not exist at the target path,
/// it creates them with default settings.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(override_path: Option<&PathBuf>) -> Result<AppConfig> {
    let config_file_path = get_config_path_or_default(override_path)?;
    tracing::debug!("Attempting to load config from: {}", config_file_path.display());

    let app_config_dir = config_file_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config file path provided or determined"))?;

    if !config_file_path.exists() {
        tracing::info!(
            "Config file not found at '{}'. Creating default.",
            config_file_path.display()
        );
        fs::create_dir_all(app_config_dir).with_context(|| {
            format!("Failed to create config directory: {}", app_config_dir.display())
        })?;
        let default_config = AppConfig::default();
        save_config(&default_config, override_path)?;
        Ok(default_config)
    } else {
        tracing::debug!("Loading config from '{}'", config_file_path.display());
        let config_content = fs::read_to_string(&config_file_path).with_context(|| {
            format!("Failed to read config file at '{}'", config_file_path.display())
        })?;

        match toml::from_str(&config_content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!(
                    "Failed to parse config file at '{}': {}. Ensure it is valid TOML.",
                    config_file_path.display(),
                    e
                );
                anyhow::bail!("Failed to parse configuration file: {}", e)
            }
        }
    }
}

/// Saves the provided application configuration to ENV, a specified path, or the default location.
///
/// Creates the configuration directory if it doesn't exist.
/// Overwrites the existing configuration file at the target path.
pub fn save_config(config: &AppConfig, override_path: Option<&PathBuf>) -> Result<()> {
    let config_file_path = get_config_path_or_default(override_path)?;
    let app_config_dir = config_file_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config file path provided or determined"))?;

    fs::create_dir_all(app_config_dir).with_context(|| {
        format!("Failed to create config directory: {}", app_config_dir.display())
    })?;

    let config_content = toml::to_string_pretty(config)
        .with_context(|| "Failed to serialize configuration to TOML")?;

    fs::write(&config_file_path, config_content).with_context(|| {
        format!("Failed to write config file to '{}'", config_file_path.display())
    })?;

    tracing::debug!("Configuration saved to '{}'", config_file_path.display());
    Ok(())
}
