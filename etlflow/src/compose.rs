//! Stage composition.
//!
//! A composed transform threads a document stream through an ordered
//! sub-sequence of stages: each stage's output stream becomes the next
//! stage's input. The transform captures its stage selection and live flag
//! at build time and is otherwise stateless; if the underlying pipeline's
//! stage list changes, the caller rebuilds.

use crate::document::Document;
use crate::errors::EtlflowError;
use crate::stage::{docs_to_stream, DocStream, Stage};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;

/// An ordered sub-sequence of stages selected from one pipeline.
#[derive(Clone, Default)]
pub struct StageSelection {
    stages: Vec<Arc<dyn Stage>>,
}

impl StageSelection {
    /// Creates a selection over the given stages.
    #[must_use]
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Returns the number of selected stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stages are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the selected stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Composes the selection into a single transform.
    #[must_use]
    pub fn compose(&self, live: bool) -> ComposedTransform {
        ComposedTransform {
            stages: self.stages.clone(),
            live,
        }
    }
}

impl fmt::Debug for StageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageSelection")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// A single streaming transform built from an ordered stage selection.
///
/// An empty selection composes to the yield-nothing transform: applying it
/// produces an empty stream for any input. The invocation modes rely on
/// that as the safe empty-range fallback.
#[derive(Clone)]
pub struct ComposedTransform {
    stages: Vec<Arc<dyn Stage>>,
    live: bool,
}

impl ComposedTransform {
    /// Returns the number of composed stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the transform was built from an empty selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the live flag captured at build time.
    #[must_use]
    pub fn live(&self) -> bool {
        self.live
    }

    /// Threads an input stream through the composed stages in order.
    ///
    /// The live flag is forwarded verbatim to every stage. Laziness is
    /// preserved end to end: nothing runs until the returned stream is
    /// polled, and per-stage emission order is preserved.
    #[must_use]
    pub fn apply(&self, input: DocStream) -> DocStream {
        if self.stages.is_empty() {
            return stream::empty().boxed();
        }
        let mut current = input;
        for stage in &self.stages {
            current = stage.process(current, self.live);
        }
        current
    }

    /// Applies the transform to an already-materialized batch and collects
    /// the full result.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure encountered while draining.
    pub async fn run_batch(&self, batch: Vec<Document>) -> Result<Vec<Document>, EtlflowError> {
        self.apply(docs_to_stream(batch)).try_collect().await
    }
}

impl fmt::Debug for ComposedTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedTransform")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("live", &self.live)
            .finish()
    }
}
