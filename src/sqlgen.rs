//! Prompt construction, chat completion and SQL extraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::bigquery::{BigQueryClient, TableMetadata};
use crate::config::{AppConfig, OpenAiConfig};
use crate::constants::OPENAI_API_KEY_ENV;
use crate::embedding::EmbeddingProvider;
use crate::error::{BqSqlError, Result};
use crate::qdrant_client_trait::QdrantClientTrait;
use crate::retrieval::{decide_tables, TableCandidate};

/// Sequence the generation stops at: the model is asked to write
/// `SQLQuery:` then would continue with `SQLResult:`, which we never want.
pub const STOP_SEQUENCE: &str = "\nSQLResult:";

const PROMPT_TEMPLATE: &str = r#"Given an input question, first create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer. You can order the results by a relevant column to return the most interesting examples in the database.

Never query for all the columns from a specific table, only ask for a the few relevant columns given the question.

Pay attention to use only the column names that you can see in the schema description. Be careful to not query for columns that do not exist. Also, pay attention to which column is in which table.

The table name must be qualified by `project_id`.`dataset_id`.`table_id`. You must use the full name of the table.

Input language is {input_language}.

Use the following format:

Question: "Question here"
SQLQuery: "SQL Query to run"
SQLResult: "Result of the SQLQuery"
Answer: "Final answer here"

Only use the tables listed below.

{table_info}

Question: {input}"#;

/// Renders the SQL-generation prompt.
///
/// `table_info` is the newline-joined JSON of the candidate tables; `input`
/// is the user question suffixed with `\nSQLQuery:` so the model answers in
/// the framed format.
pub fn render_prompt(
    dialect: &str,
    input_language: &str,
    tables: &[TableMetadata],
    question: &str,
) -> Result<String> {
    let table_info = tables
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?
        .join("\n");
    let input = format!("{} \nSQLQuery:", question);
    Ok(PROMPT_TEMPLATE
        .replace("{dialect}", dialect)
        .replace("{input_language}", input_language)
        .replace("{table_info}", &table_info)
        .replace("{input}", &input))
}

/// A chat completion backend. Implemented by the OpenAI client and mocked in
/// tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Completes a single-user-message prompt, honoring the stop sequences.
    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stop: &'a [String],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat client against an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatModel {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    /// Builds a chat model from config, with the API key from `OPENAI_API_KEY`.
    pub fn from_env(openai: &OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var(OPENAI_API_KEY_ENV)
            .map_err(|_| BqSqlError::MissingCredential(OPENAI_API_KEY_ENV.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(openai.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: openai.api_base_url.clone(),
            api_key,
            model: openai.chat_model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.0,
            stop,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(BqSqlError::LlmError(format!(
                "chat API returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BqSqlError::LlmError("chat API returned no choices".to_string()))
    }
}

/// SQL keywords that mark the start of a statement.
const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "MERGE",
];

/// Normalizes raw model output into a bare SQL statement.
///
/// Strips markdown fences and surrounding quotes, drops any preamble before
/// the first SQL keyword, and cuts at the first `;`.
pub fn clean_sql_output(raw: &str) -> String {
    let mut s = raw.trim();

    if let Some(rest) = s.strip_prefix("```sql") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    s = s.strip_suffix("```").unwrap_or(s).trim();
    s = s.trim_matches('"').trim();

    let s = match first_sql_keyword(s) {
        Some(pos) if pos > 0 => &s[pos..],
        _ => s,
    };

    match s.find(';') {
        Some(pos) => s[..pos].trim().to_string(),
        None => s.trim().to_string(),
    }
}

/// Byte offset of the first SQL keyword that starts a word, compared
/// case-insensitively against `s` itself so the offset is always a valid
/// char boundary.
fn first_sql_keyword(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut at_word_start = true;
    for (pos, c) in s.char_indices() {
        if at_word_start {
            for kw in SQL_KEYWORDS {
                let end = pos + kw.len();
                if end > bytes.len() || !bytes[pos..end].eq_ignore_ascii_case(kw.as_bytes()) {
                    continue;
                }
                // Keyword must also end the word, not continue into one
                let continues = bytes
                    .get(end)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_');
                if !continues {
                    return Some(pos);
                }
            }
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    None
}

/// The outcome of one question: the generated SQL and the tables it was
/// grounded on.
#[derive(Debug)]
pub struct SqlGeneration {
    /// The cleaned SQL statement.
    pub sql: String,
    /// Candidate tables that were offered to the model, best score first.
    pub tables: Vec<TableCandidate>,
}

/// Generates SQL for a question given already-retrieved table metadata.
pub async fn generate_sql(
    chat: &dyn ChatModel,
    config: &AppConfig,
    tables: &[TableMetadata],
    question: &str,
) -> Result<String> {
    let prompt = render_prompt(
        &config.query.dialect,
        &config.query.input_language,
        tables,
        question,
    )?;
    tracing::debug!("Rendered prompt of {} chars", prompt.len());
    let stop = vec![STOP_SEQUENCE.to_string()];
    let raw = chat.complete(&prompt, &stop).await?;
    let sql = clean_sql_output(&raw);
    if sql.is_empty() {
        return Err(BqSqlError::LlmError("model returned empty SQL".to_string()));
    }
    Ok(sql)
}

/// Retrieval followed by generation: the full question-to-SQL pipeline.
pub async fn answer_question<C>(
    client: Arc<C>,
    bigquery: &BigQueryClient,
    embedder: &dyn EmbeddingProvider,
    chat: &dyn ChatModel,
    config: &AppConfig,
    question: &str,
    top_k: u64,
) -> Result<SqlGeneration>
where
    C: QdrantClientTrait + Send + Sync + 'static,
{
    let retrieved = decide_tables(
        client,
        bigquery,
        embedder,
        &config.collection_name,
        question,
        top_k,
    )
    .await?;

    let (candidates, metadata): (Vec<TableCandidate>, Vec<TableMetadata>) =
        retrieved.into_iter().unzip();
    let sql = generate_sql(chat, config, &metadata, question).await?;
    Ok(SqlGeneration { sql, tables: candidates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigquery::TableSchemaField;
    use mockall::predicate;

    fn sample_table() -> TableMetadata {
        TableMetadata {
            id: "p.d.orders".to_string(),
            project_id: "p".to_string(),
            dataset_id: "d".to_string(),
            table_id: "orders".to_string(),
            description: None,
            schema: vec![TableSchemaField {
                name: "amount".to_string(),
                field_type: "NUMERIC".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_prompt_substitutes_variables() {
        let prompt =
            render_prompt("bigquery", "English", &[sample_table()], "total order amount?").unwrap();
        assert!(prompt.contains("syntactically correct bigquery query"));
        assert!(prompt.contains("Input language is English."));
        assert!(prompt.contains("\"id\":\"p.d.orders\""));
        assert!(prompt.ends_with("Question: total order amount? \nSQLQuery:"));
        assert!(!prompt.contains("{dialect}"));
        assert!(!prompt.contains("{table_info}"));
    }

    #[test]
    fn test_render_prompt_joins_tables_with_newline() {
        let mut second = sample_table();
        second.id = "p.d.users".to_string();
        second.table_id = "users".to_string();
        let prompt = render_prompt("bigquery", "English", &[sample_table(), second], "q").unwrap();
        let info_start = prompt.find("{\"id\":\"p.d.orders\"").unwrap();
        let info_end = prompt.find("{\"id\":\"p.d.users\"").unwrap();
        assert!(info_start < info_end);
    }

    #[test]
    fn clean_sql_strips_fences() {
        assert_eq!(
            clean_sql_output("```sql\nSELECT * FROM `p.d.t`;\n```"),
            "SELECT * FROM `p.d.t`"
        );
    }

    #[test]
    fn clean_sql_takes_first_statement() {
        assert_eq!(clean_sql_output("SELECT 1; SELECT 2;"), "SELECT 1");
    }

    #[test]
    fn clean_sql_strips_preamble() {
        assert_eq!(
            clean_sql_output("Here is the query:\n\nSELECT count(*) FROM `p.d.users`"),
            "SELECT count(*) FROM `p.d.users`"
        );
    }

    #[test]
    fn clean_sql_strips_surrounding_quotes() {
        assert_eq!(clean_sql_output("\"SELECT 1\""), "SELECT 1");
    }

    #[test]
    fn clean_sql_handles_multibyte_preamble() {
        // Uppercasing can change byte lengths (ﬁ → FI); offsets must stay
        // valid char boundaries in the original string
        assert_eq!(clean_sql_output("ﬁ。SELECT 1"), "SELECT 1");
        assert_eq!(
            clean_sql_output("クエリは次の通り：\nSELECT * FROM `p.d.t`;"),
            "SELECT * FROM `p.d.t`"
        );
    }

    #[test]
    fn clean_sql_skips_keyword_embedded_in_word() {
        assert_eq!(
            clean_sql_output("UNSELECTED items: SELECT 1"),
            "SELECT 1"
        );
    }

    #[test]
    fn clean_sql_preserves_plain() {
        assert_eq!(
            clean_sql_output("WITH t AS (SELECT 1) SELECT * FROM t"),
            "WITH t AS (SELECT 1) SELECT * FROM t"
        );
    }

    #[tokio::test]
    async fn test_generate_sql_uses_stop_sequence() {
        let mut chat = MockChatModel::new();
        chat.expect_complete()
            .with(
                predicate::function(|prompt: &str| prompt.contains("SQLQuery:")),
                predicate::function(|stop: &[String]| stop == [STOP_SEQUENCE.to_string()]),
            )
            .returning(|_, _| Ok(" SELECT amount FROM `p.d.orders` LIMIT 10;".to_string()));

        let config = AppConfig::default();
        let sql = generate_sql(&chat, &config, &[sample_table()], "largest orders?")
            .await
            .unwrap();
        assert_eq!(sql, "SELECT amount FROM `p.d.orders` LIMIT 10");
    }

    #[tokio::test]
    async fn test_generate_sql_rejects_empty_output() {
        let mut chat = MockChatModel::new();
        chat.expect_complete().returning(|_, _| Ok("```\n```".to_string()));

        let config = AppConfig::default();
        let result = generate_sql(&chat, &config, &[sample_table()], "q").await;
        assert!(matches!(result, Err(BqSqlError::LlmError(_))));
    }
}
