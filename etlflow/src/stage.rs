//! Stage trait and the lazy document stream it operates on.
//!
//! Stages are the units of work inside a named pipeline. Each stage maps a
//! lazy stream of documents to another lazy stream; chaining those maps in
//! order is how the composer builds a sub-pipeline transform. Production of
//! each document is a suspension point: a consumer that stops polling leaves
//! the remaining upstream work undone.

use crate::document::Document;
use crate::errors::EtlflowError;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A lazy, pull-driven stream of documents.
///
/// Stage failures travel in-stream as `Err` items and surface untranslated
/// to whoever consumes the invocation mode.
pub type DocStream = BoxStream<'static, Result<Document, EtlflowError>>;

/// The capability a stage advertises within its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Produces documents, possibly ex nihilo.
    Generator,
    /// Maps input documents to output documents.
    Transformer,
    /// Performs side effects and passes documents through.
    Executor,
}

impl Default for StageKind {
    fn default() -> Self {
        Self::Transformer
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generator => write!(f, "generator"),
            Self::Transformer => write!(f, "transformer"),
            Self::Executor => write!(f, "executor"),
        }
    }
}

/// Trait for pipeline stages.
///
/// The `live` flag distinguishes real execution from preview/dry-run. The
/// engine forwards it verbatim to every stage; what a stage does with it is
/// its own business.
pub trait Stage: Send + Sync + fmt::Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the stage's capability.
    fn kind(&self) -> StageKind;

    /// Maps an input document stream to an output document stream.
    ///
    /// The returned stream must not borrow from `self`; implementations
    /// clone whatever state they need into it.
    fn process(&self, input: DocStream, live: bool) -> DocStream;
}

/// Wraps a batch of documents as an already-materialized stream.
#[must_use]
pub fn docs_to_stream(docs: Vec<Document>) -> DocStream {
    stream::iter(docs.into_iter().map(Ok)).boxed()
}

/// Wraps a single error as a one-item stream.
#[must_use]
pub fn error_stream(error: EtlflowError) -> DocStream {
    stream::once(async move { Err(error) }).boxed()
}

/// A batch-function stage.
///
/// Collects its whole input, applies the function, and streams the results.
/// Convenient for stages whose logic is naturally batch-shaped and for
/// tests; genuinely incremental stages implement [`Stage`] directly.
pub struct FnStage<F>
where
    F: Fn(Vec<Document>, bool) -> Result<Vec<Document>, EtlflowError> + Send + Sync + 'static,
{
    name: String,
    kind: StageKind,
    func: Arc<F>,
}

impl<F> FnStage<F>
where
    F: Fn(Vec<Document>, bool) -> Result<Vec<Document>, EtlflowError> + Send + Sync + 'static,
{
    /// Creates a new batch-function stage.
    pub fn new(name: impl Into<String>, kind: StageKind, func: F) -> Self {
        Self {
            name: name.into(),
            kind,
            func: Arc::new(func),
        }
    }
}

impl<F> fmt::Debug for FnStage<F>
where
    F: Fn(Vec<Document>, bool) -> Result<Vec<Document>, EtlflowError> + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(Vec<Document>, bool) -> Result<Vec<Document>, EtlflowError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    fn process(&self, input: DocStream, live: bool) -> DocStream {
        let func = Arc::clone(&self.func);
        stream::once(async move {
            let batch: Result<Vec<Document>, EtlflowError> = input.try_collect().await;
            match batch.and_then(|docs| (func)(docs, live)) {
                Ok(docs) => docs_to_stream(docs),
                Err(e) => error_stream(e),
            }
        })
        .flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(key: &str, value: i64) -> Document {
        let mut d = Document::new();
        d.set(key, value);
        d
    }

    #[tokio::test]
    async fn test_fn_stage_maps_batch() {
        let stage = FnStage::new("double", StageKind::Transformer, |batch, _live| {
            Ok(batch
                .into_iter()
                .map(|mut d| {
                    let n = d.get("n").and_then(serde_json::Value::as_i64).unwrap_or(0);
                    d.set("n", n * 2);
                    d
                })
                .collect())
        });

        assert_eq!(stage.name(), "double");
        assert_eq!(stage.kind(), StageKind::Transformer);

        let out: Vec<Document> = stage
            .process(docs_to_stream(vec![doc("n", 1), doc("n", 2)]), true)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(out, vec![doc("n", 2), doc("n", 4)]);
    }

    #[tokio::test]
    async fn test_fn_stage_propagates_errors() {
        let stage = FnStage::new("boom", StageKind::Transformer, |_batch, _live| {
            Err(EtlflowError::stage("boom", "bad input"))
        });

        let result: Result<Vec<Document>, EtlflowError> =
            stage.process(docs_to_stream(vec![]), true).try_collect().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fn_stage_sees_live_flag() {
        let stage = FnStage::new("flagged", StageKind::Executor, |mut batch, live| {
            for d in &mut batch {
                d.set("live", live);
            }
            Ok(batch)
        });

        let out: Vec<Document> = stage
            .process(docs_to_stream(vec![Document::new()]), false)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(out[0].get("live"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn test_stage_kind_display_and_serde() {
        assert_eq!(StageKind::Generator.to_string(), "generator");
        assert_eq!(StageKind::Executor.to_string(), "executor");

        let json = serde_json::to_string(&StageKind::Transformer).unwrap();
        assert_eq!(json, r#""transformer""#);
    }
}
