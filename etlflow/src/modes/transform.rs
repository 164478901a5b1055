//! The transform invocation mode, single-pass and cyclic.

use crate::compose::ComposedTransform;
use crate::document::Document;
use crate::errors::EtlflowError;
use crate::modes::Generate;
use crate::stage::{error_stream, DocStream, StageKind};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::warn;

/// Sub-pipeline invocation as a transformer.
///
/// Single-pass: each input document is cloned, generated through the
/// sub-pipeline, and every result gets the configured source fields merged
/// back in before being yielded. Output cardinality is the sum of each
/// input's result count; an input whose sub-pipeline yields nothing
/// contributes nothing.
///
/// Cyclic: each input starts a self-feeding chain that repeatedly takes the
/// first generated document, yields a clone of it, and feeds it back in,
/// running while the designated stop field on the current document is
/// non-empty. The chain is bounded only by the data; a sub-pipeline that
/// never empties the stop field never terminates unless the optional step
/// cap is set.
#[derive(Debug, Clone)]
pub struct Transform {
    transform: ComposedTransform,
    merge_fields: String,
    stop_field: String,
    cyclic: bool,
    max_steps: Option<usize>,
}

impl Transform {
    /// The capability this mode reports.
    pub const KIND: StageKind = StageKind::Transformer;

    /// The default stop-condition field name.
    pub const DEFAULT_STOP_FIELD: &'static str = "column";

    /// Creates the single-pass mode over a composed transform.
    #[must_use]
    pub fn new(transform: ComposedTransform) -> Self {
        Self {
            transform,
            merge_fields: String::new(),
            stop_field: Self::DEFAULT_STOP_FIELD.to_string(),
            cyclic: false,
            max_steps: None,
        }
    }

    /// Sets the space-separated source fields merged into every result.
    #[must_use]
    pub fn with_merge_fields(mut self, fields: impl Into<String>) -> Self {
        self.merge_fields = fields.into();
        self
    }

    /// Switches to the cyclic chain, stopping when `stop_field` is empty or
    /// missing on the current document.
    #[must_use]
    pub fn cyclic(mut self, stop_field: impl Into<String>) -> Self {
        self.cyclic = true;
        self.stop_field = stop_field.into();
        self
    }

    /// Caps the cyclic chain at `max_steps` iterations per input.
    ///
    /// The engine's default keeps the original unbounded behavior; the cap
    /// is an opt-in safety net for sub-pipelines whose stop field may never
    /// empty.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Runs the sub-pipeline once for a single document and merges the
    /// first result back into it in place.
    ///
    /// The sub-pipeline sees a clone; the source document gains every field
    /// of the first result, overwriting on name collision. Zero results
    /// leave the document untouched.
    ///
    /// # Errors
    ///
    /// Surfaces a stage failure raised while producing the first result.
    pub async fn run_one(&self, document: &mut Document) -> Result<(), EtlflowError> {
        let mut generated = Generate::new(self.transform.clone()).run(Some(document.clone()));
        if let Some(result) = generated.next().await.transpose()? {
            document.merge(&result);
        }
        Ok(())
    }

    /// Drives the mode over an input stream.
    ///
    /// Input-major ordering is preserved: all documents produced for one
    /// input are yielded, in the sub-pipeline's emission order, before the
    /// next input is pulled.
    #[must_use]
    pub fn run(&self, input: DocStream) -> DocStream {
        let mode = self.clone();
        input
            .flat_map(move |item| match item {
                Ok(document) => {
                    if mode.cyclic {
                        mode.cyclic_chain(document)
                    } else {
                        mode.single_pass(document)
                    }
                }
                Err(e) => error_stream(e),
            })
            .boxed()
    }

    fn single_pass(&self, document: Document) -> DocStream {
        let merge_fields = self.merge_fields.clone();
        Generate::new(self.transform.clone())
            .run(Some(document.clone()))
            .map_ok(move |mut result| {
                result.merge_query(&document, &merge_fields);
                result
            })
            .boxed()
    }

    fn cyclic_chain(&self, document: Document) -> DocStream {
        let transform = self.transform.clone();
        let stop_field = self.stop_field.clone();
        let max_steps = self.max_steps;
        stream::unfold((Some(document), 0_usize), move |(current, steps)| {
            let transform = transform.clone();
            let stop_field = stop_field.clone();
            async move {
                let current = current?;
                if current.text_of(&stop_field).is_empty() {
                    return None;
                }
                if max_steps.is_some_and(|cap| steps >= cap) {
                    warn!(steps, field = %stop_field, "cyclic transform reached its step cap");
                    return None;
                }

                let mut generated = Generate::new(transform).run(Some(current.clone()));
                match generated.next().await {
                    None => None,
                    Some(Err(e)) => Some((Err(e), (None, steps))),
                    Some(Ok(result)) => {
                        let emitted = result.clone();
                        Some((Ok(emitted), (Some(result), steps + 1)))
                    }
                }
            }
        })
        .boxed()
    }
}
