//! Sub-pipeline references.
//!
//! A reference binds an injected registry, a pipeline name, and a range
//! expression. Resolving it looks the pipeline up (fatal if missing),
//! ensures it is loaded, resolves the range against its stage count, and
//! returns the selected stage slice ready for composition.

use crate::compose::StageSelection;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::errors::EtlflowError;
use crate::range::resolve_range;
use crate::registry::PipelineRegistry;
use std::fmt;
use std::sync::Arc;

/// A configured reference to a slice of a named pipeline.
#[derive(Clone)]
pub struct SubPipelineRef {
    registry: Arc<dyn PipelineRegistry>,
    pipeline: String,
    range: String,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl SubPipelineRef {
    /// Creates a reference to the named pipeline, selecting all stages.
    pub fn new(registry: Arc<dyn PipelineRegistry>, pipeline: impl Into<String>) -> Self {
        Self {
            registry,
            pipeline: pipeline.into(),
            range: String::new(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    /// Sets the range expression (Python-slice syntax, e.g. `2:-1`).
    #[must_use]
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    /// Sets the diagnostic sink for range-expression complaints.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the referenced pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline
    }

    /// Resolves the reference into a stage selection.
    ///
    /// A malformed range expression degrades to the full range with one
    /// diagnostic report; the resulting selection may be empty, which the
    /// invocation modes treat as "nothing to run", not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EtlflowError::PipelineNotFound`] if the named pipeline is
    /// not registered, or a load error from the handle.
    pub async fn resolve(&self) -> Result<StageSelection, EtlflowError> {
        let handle = self.registry.find_pipeline(&self.pipeline).await?;
        handle.ensure_loaded().await?;
        let stages = handle.stages();
        let range = resolve_range(&self.range, stages.len(), self.diagnostics.as_ref());
        Ok(StageSelection::new(range.slice(&stages).to_vec()))
    }
}

impl fmt::Debug for SubPipelineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubPipelineRef")
            .field("pipeline", &self.pipeline)
            .field("range", &self.range)
            .finish()
    }
}
