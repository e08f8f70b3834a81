//! BigQuery table metadata types and the REST v2 client used to fetch them.
//!
//! Authentication uses an OAuth2 access token from the `BIGQUERY_ACCESS_TOKEN`
//! environment variable (e.g. `gcloud auth print-access-token`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{BIGQUERY_API_BASE, BIGQUERY_TOKEN_ENV};
use crate::error::{BqSqlError, Result};

/// A single column of a table schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableSchemaField {
    /// Column name.
    pub name: String,
    /// BigQuery column type (e.g. `STRING`, `INTEGER`, `TIMESTAMP`).
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Identifies one table inside a project and dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentifier {
    /// GCP project id.
    pub project_id: String,
    /// Dataset id within the project.
    pub dataset_id: String,
    /// Table id within the dataset.
    pub table_id: String,
}

impl TableIdentifier {
    /// Fully qualified table name, `project.dataset.table`.
    pub fn fully_qualified(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// Full metadata for one table: identity, description and column schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Fully qualified table name, `project.dataset.table`.
    pub id: String,
    /// GCP project id.
    pub project_id: String,
    /// Dataset id within the project.
    pub dataset_id: String,
    /// Table id within the dataset.
    pub table_id: String,
    /// Optional table description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Column schema.
    pub schema: Vec<TableSchemaField>,
}

impl TableMetadata {
    /// The identifier portion of this metadata.
    pub fn identifier(&self) -> TableIdentifier {
        TableIdentifier {
            project_id: self.project_id.clone(),
            dataset_id: self.dataset_id.clone(),
            table_id: self.table_id.clone(),
        }
    }
}

// --- REST wire types (tables.list / tables.get) ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TableListResponse {
    #[serde(default)]
    tables: Vec<TableListEntry>,
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TableListEntry {
    table_reference: TableReference,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TableReference {
    project_id: String,
    dataset_id: String,
    table_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TableGetResponse {
    table_reference: TableReference,
    description: Option<String>,
    schema: Option<TableGetSchema>,
}

#[derive(Deserialize, Debug)]
struct TableGetSchema {
    #[serde(default)]
    fields: Vec<TableSchemaField>,
}

impl From<TableGetResponse> for TableMetadata {
    fn from(resp: TableGetResponse) -> Self {
        let r = resp.table_reference;
        TableMetadata {
            id: format!("{}.{}.{}", r.project_id, r.dataset_id, r.table_id),
            project_id: r.project_id,
            dataset_id: r.dataset_id,
            table_id: r.table_id,
            description: resp.description,
            schema: resp.schema.map(|s| s.fields).unwrap_or_default(),
        }
    }
}

/// Thin client over the BigQuery REST v2 tables endpoints.
pub struct BigQueryClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl BigQueryClient {
    /// Builds a client using the token from `BIGQUERY_ACCESS_TOKEN`.
    pub fn from_env(request_timeout_secs: u64) -> Result<Self> {
        let access_token = std::env::var(BIGQUERY_TOKEN_ENV)
            .map_err(|_| BqSqlError::MissingCredential(BIGQUERY_TOKEN_ENV.to_string()))?;
        Self::new(BIGQUERY_API_BASE.to_string(), access_token, request_timeout_secs)
    }

    /// Builds a client against an explicit API base URL (used by tests).
    pub fn new(api_base: String, access_token: String, request_timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;
        Ok(Self { http, api_base, access_token })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(BqSqlError::BigQueryError(format!(
                "request to {} failed with {}: {}",
                url, status, body
            )));
        }
        Ok(response.json::<T>().await?)
    }

    /// Lists every table of a dataset and fetches each table's full metadata.
    ///
    /// Follows `nextPageToken` pagination on the list endpoint.
    pub async fn list_dataset_tables(
        &self,
        project_id: &str,
        dataset_id: &str,
    ) -> Result<Vec<TableMetadata>> {
        let list_url = format!(
            "{}/projects/{}/datasets/{}/tables",
            self.api_base, project_id, dataset_id
        );

        let mut references: Vec<TableReference> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = match &page_token {
                Some(token) => format!("{}?maxResults=1000&pageToken={}", list_url, token),
                None => format!("{}?maxResults=1000", list_url),
            };
            let page: TableListResponse = self.get_json(&url).await?;
            references.extend(page.tables.into_iter().map(|t| t.table_reference));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(
            "Found {} tables in dataset {}.{}",
            references.len(),
            project_id,
            dataset_id
        );

        let mut tables = Vec::with_capacity(references.len());
        for reference in references {
            let identifier = TableIdentifier {
                project_id: reference.project_id,
                dataset_id: reference.dataset_id,
                table_id: reference.table_id,
            };
            tables.push(self.get_table_metadata(&identifier).await?);
        }
        Ok(tables)
    }

    /// Fetches full metadata for a single table.
    pub async fn get_table_metadata(&self, identifier: &TableIdentifier) -> Result<TableMetadata> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.api_base, identifier.project_id, identifier.dataset_id, identifier.table_id
        );
        tracing::debug!("Fetching table metadata for {}", identifier.fully_qualified());
        let response: TableGetResponse = self.get_json(&url).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_qualified_name() {
        let identifier = TableIdentifier {
            project_id: "my_project".to_string(),
            dataset_id: "my_dataset".to_string(),
            table_id: "events".to_string(),
        };
        assert_eq!(identifier.fully_qualified(), "my_project.my_dataset.events");
    }

    #[test]
    fn test_parse_table_get_response() {
        let json = r#"{
            "tableReference": {
                "projectId": "my_project",
                "datasetId": "my_dataset",
                "tableId": "events"
            },
            "description": "Raw event stream",
            "schema": {
                "fields": [
                    {"name": "event_id", "type": "STRING", "mode": "REQUIRED"},
                    {"name": "ts", "type": "TIMESTAMP"}
                ]
            }
        }"#;
        let response: TableGetResponse = serde_json::from_str(json).unwrap();
        let metadata: TableMetadata = response.into();
        assert_eq!(metadata.id, "my_project.my_dataset.events");
        assert_eq!(metadata.description.as_deref(), Some("Raw event stream"));
        assert_eq!(metadata.schema.len(), 2);
        assert_eq!(metadata.schema[0].name, "event_id");
        assert_eq!(metadata.schema[0].field_type, "STRING");
    }

    #[test]
    fn test_parse_table_get_response_without_schema() {
        let json = r#"{
            "tableReference": {
                "projectId": "p",
                "datasetId": "d",
                "tableId": "t"
            }
        }"#;
        let response: TableGetResponse = serde_json::from_str(json).unwrap();
        let metadata: TableMetadata = response.into();
        assert!(metadata.description.is_none());
        assert!(metadata.schema.is_empty());
    }

    #[test]
    fn test_parse_table_list_response() {
        let json = r#"{
            "tables": [
                {"tableReference": {"projectId": "p", "datasetId": "d", "tableId": "a"}},
                {"tableReference": {"projectId": "p", "datasetId": "d", "tableId": "b"}}
            ],
            "nextPageToken": "tok123"
        }"#;
        let response: TableListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tables.len(), 2);
        assert_eq!(response.next_page_token.as_deref(), Some("tok123"));
    }

    #[test]
    fn test_parse_empty_table_list() {
        let response: TableListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.tables.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn test_metadata_json_uses_type_key() {
        let metadata = TableMetadata {
            id: "p.d.t".to_string(),
            project_id: "p".to_string(),
            dataset_id: "d".to_string(),
            table_id: "t".to_string(),
            description: None,
            schema: vec![TableSchemaField {
                name: "amount".to_string(),
                field_type: "NUMERIC".to_string(),
            }],
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"type\":\"NUMERIC\""));
        assert!(!json.contains("field_type"));
        assert!(!json.contains("description"));
    }
}
