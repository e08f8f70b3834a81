// Fields used in Qdrant payloads and filters

/// The field name used for storing the fully qualified table id in Qdrant payloads.
pub const FIELD_ID: &str = "id";
/// The field name used for storing the GCP project id.
pub const FIELD_PROJECT_ID: &str = "project_id";
/// The field name used for storing the dataset id.
pub const FIELD_DATASET_ID: &str = "dataset_id";
/// The field name used for storing the table id.
pub const FIELD_TABLE_ID: &str = "table_id";
/// The field name used for storing the document source (same as the table id).
pub const FIELD_SOURCE: &str = "source";
/// The field name used for storing the raw chunk text.
pub const FIELD_CHUNK_CONTENT: &str = "chunk_content";

// Other constants

/// Default Qdrant collection holding the indexed table metadata.
pub const DEFAULT_COLLECTION_NAME: &str = "bigquery_metadata";
/// Base URL of the BigQuery REST API.
pub const BIGQUERY_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";
/// Environment variable holding the OAuth2 access token for BigQuery.
pub const BIGQUERY_TOKEN_ENV: &str = "BIGQUERY_ACCESS_TOKEN";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
