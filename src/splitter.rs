//! Document preparation: turning table metadata into store-ready texts and
//! splitting those texts into bounded chunks.

use std::collections::BTreeMap;

use crate::bigquery::TableMetadata;
use crate::config::ChunkingConfig;
use crate::constants::{FIELD_DATASET_ID, FIELD_ID, FIELD_PROJECT_ID, FIELD_SOURCE, FIELD_TABLE_ID};
use crate::error::Result;

/// A text to embed together with the payload metadata attached to every chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputText {
    /// The text that gets chunked and embedded.
    pub text: String,
    /// Payload fields stored alongside every chunk of this text.
    pub metadata: BTreeMap<String, String>,
}

impl InputText {
    /// Builds a document from one table's metadata.
    ///
    /// The text is the JSON serialization of the metadata; the payload carries
    /// the table identity so search hits can be mapped back to tables.
    pub fn from_table_metadata(table: &TableMetadata) -> Result<Self> {
        let text = serde_json::to_string(table)?;
        let mut metadata = BTreeMap::new();
        metadata.insert(FIELD_SOURCE.to_string(), table.id.clone());
        metadata.insert(FIELD_ID.to_string(), table.id.clone());
        metadata.insert(FIELD_PROJECT_ID.to_string(), table.project_id.clone());
        metadata.insert(FIELD_DATASET_ID.to_string(), table.dataset_id.clone());
        metadata.insert(FIELD_TABLE_ID.to_string(), table.table_id.clone());
        Ok(Self { text, metadata })
    }
}

/// Character-based text splitter.
///
/// The text is split on `separator`, the pieces are greedily re-joined into
/// chunks of at most `chunk_size` characters, and each chunk after the first
/// starts with up to `chunk_overlap` trailing characters of its predecessor.
/// A piece longer than `chunk_size` is passed through as its own chunk.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separator: String,
}

impl TextSplitter {
    /// Creates a splitter with explicit parameters.
    ///
    /// `chunk_overlap` is clamped below `chunk_size` so a chunk can always
    /// hold more than its overlap prefix.
    pub fn new(chunk_size: usize, chunk_overlap: usize, separator: impl Into<String>) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separator: separator.into(),
        }
    }

    /// Creates a splitter from the chunking section of the config.
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.separator.clone())
    }

    /// Splits `text` into chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let pieces: Vec<&str> = if self.separator.is_empty() {
            vec![text]
        } else {
            text.split(self.separator.as_str()).collect()
        };
        let sep_len = char_len(&self.separator);

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        for piece in pieces {
            if current.is_empty() {
                current.push_str(piece);
            } else if char_len(&current) + sep_len + char_len(piece) <= self.chunk_size {
                current.push_str(&self.separator);
                current.push_str(piece);
            } else {
                let overlap = tail_chars(&current, self.chunk_overlap);
                chunks.push(std::mem::take(&mut current));
                current = overlap;
                if !current.is_empty() {
                    current.push_str(&self.separator);
                }
                current.push_str(piece);
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`, respecting char boundaries.
fn tail_chars(s: &str, n: usize) -> String {
    let len = char_len(s);
    if n == 0 || len == 0 {
        return String::new();
    }
    if len <= n {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigquery::TableSchemaField;

    fn sample_table() -> TableMetadata {
        TableMetadata {
            id: "p.d.orders".to_string(),
            project_id: "p".to_string(),
            dataset_id: "d".to_string(),
            table_id: "orders".to_string(),
            description: Some("Customer orders".to_string()),
            schema: vec![TableSchemaField {
                name: "order_id".to_string(),
                field_type: "STRING".to_string(),
            }],
        }
    }

    #[test]
    fn test_document_from_table_metadata() {
        let doc = InputText::from_table_metadata(&sample_table()).unwrap();
        assert!(doc.text.contains("\"id\":\"p.d.orders\""));
        assert_eq!(doc.metadata.get("id").map(String::as_str), Some("p.d.orders"));
        assert_eq!(doc.metadata.get("source").map(String::as_str), Some("p.d.orders"));
        assert_eq!(doc.metadata.get("project_id").map(String::as_str), Some("p"));
        assert_eq!(doc.metadata.get("dataset_id").map(String::as_str), Some("d"));
        assert_eq!(doc.metadata.get("table_id").map(String::as_str), Some("orders"));
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::new(100, 10, ",");
        assert_eq!(splitter.split("a,b,c"), vec!["a,b,c".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = TextSplitter::new(100, 10, ",");
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn test_split_respects_chunk_size() {
        let splitter = TextSplitter::new(10, 0, ",");
        let chunks = splitter.split("aaa,bbb,ccc,ddd");
        assert_eq!(chunks, vec!["aaa,bbb".to_string(), "ccc,ddd".to_string()]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn test_split_overlap_carries_tail() {
        let splitter = TextSplitter::new(10, 3, ",");
        let chunks = splitter.split("aaa,bbb,ccc");
        assert_eq!(chunks[0], "aaa,bbb");
        // Second chunk starts with the last 3 chars of the first
        assert!(chunks[1].starts_with("bbb,"));
        assert!(chunks[1].ends_with("ccc"));
    }

    #[test]
    fn test_oversize_piece_passes_through() {
        let splitter = TextSplitter::new(5, 0, ",");
        let chunks = splitter.split("abcdefghij,xy");
        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "xy");
    }

    #[test]
    fn test_multibyte_boundary_safe() {
        let splitter = TextSplitter::new(4, 2, ",");
        // Must not panic on non-ASCII content
        let chunks = splitter.split("注文,売上,顧客");
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("abc", 0), "");
    }
}
