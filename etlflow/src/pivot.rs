//! The pivot reshaper: rows become columns and vice versa.

use crate::document::Document;
use crate::stage::{docs_to_stream, error_stream, DocStream, StageKind};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use std::collections::HashSet;

/// How many leading documents contribute to the pivoted field-name
/// universe. Larger batches are sampled, not scanned exhaustively.
pub const KEY_SAMPLE_LIMIT: usize = 100;

/// Transposes a document batch around a key column.
///
/// Each input document's key-column value becomes an output column header;
/// each field name sampled from the batch becomes one output document. With
/// no key column configured the reshaper is a pass-through. Duplicate key
/// values across inputs overwrite earlier contributions, last write wins.
#[derive(Debug, Clone, Default)]
pub struct PivotReshaper {
    key_column: String,
}

impl PivotReshaper {
    /// The capability this transform reports.
    pub const KIND: StageKind = StageKind::Transformer;

    /// Creates a reshaper keyed on the given column. An empty name means
    /// "unset" and turns the reshaper into a pass-through.
    #[must_use]
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
        }
    }

    /// Drives the reshaper over an input stream.
    ///
    /// The batch is materialized before any output is produced; an empty
    /// batch pivots to an empty stream.
    #[must_use]
    pub fn run(&self, input: DocStream) -> DocStream {
        if self.key_column.is_empty() {
            return input;
        }
        let key_column = self.key_column.clone();
        stream::once(async move {
            match input.try_collect::<Vec<Document>>().await {
                Ok(batch) => docs_to_stream(pivot_batch(&batch, &key_column)),
                Err(e) => error_stream(e),
            }
        })
        .flatten()
        .boxed()
    }
}

/// Pivots a materialized batch around `key_column`.
///
/// Output document `j` corresponds to sampled field name `k_j`; for each
/// input `i` with key value `v_i` it holds `output[j][v_i] = input[i][k_j]`
/// (null when the input lacks the field).
#[must_use]
pub fn pivot_batch(documents: &[Document], key_column: &str) -> Vec<Document> {
    let columns: Vec<String> = documents.iter().map(|d| d.text_of(key_column)).collect();
    let field_names = sampled_field_names(documents, key_column);

    let mut outputs: Vec<Document> = field_names.iter().map(|_| Document::new()).collect();
    for (document, column) in documents.iter().zip(&columns) {
        for (output, field) in outputs.iter_mut().zip(&field_names) {
            let value = document.get(field).cloned().unwrap_or(Value::Null);
            output.set(column.clone(), value);
        }
    }
    outputs
}

/// Collects the distinct field names of the first [`KEY_SAMPLE_LIMIT`]
/// documents, in first-seen order, excluding the key column itself.
fn sampled_field_names(documents: &[Document], key_column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for document in documents.iter().take(KEY_SAMPLE_LIMIT) {
        for key in document.keys() {
            if key != key_column && seen.insert(key.to_string()) {
                names.push(key.to_string());
            }
        }
    }
    names
}
