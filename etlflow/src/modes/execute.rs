//! The execute invocation mode.

use crate::compose::ComposedTransform;
use crate::document::Document;
use crate::scheduler::TaskScheduler;
use crate::stage::{DocStream, StageKind};
use futures::stream::StreamExt;
use futures::FutureExt;
use std::sync::Arc;
use tracing::warn;

/// Side-effecting dispatch: feed each input document through the
/// sub-pipeline and pass the original through unchanged.
///
/// Execute is a tap, not a replacement: whatever the sub-pipeline produces
/// is discarded, and the caller observes the input sequence element for
/// element. Deferred dispatch hands the sub-pipeline run to a background
/// scheduler keyed by the document's key field; immediate dispatch runs it
/// synchronously before yielding.
#[derive(Clone)]
pub struct Execute {
    transform: Arc<ComposedTransform>,
    scheduler: Arc<dyn TaskScheduler>,
    key_field: String,
    projection: Option<String>,
    deferred: bool,
}

impl Execute {
    /// The capability this mode reports.
    pub const KIND: StageKind = StageKind::Executor;

    /// The default key field name.
    pub const DEFAULT_KEY_FIELD: &'static str = "column";

    /// Creates the mode over a composed transform and a scheduler.
    pub fn new(transform: ComposedTransform, scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self {
            transform: Arc::new(transform),
            scheduler,
            key_field: Self::DEFAULT_KEY_FIELD.to_string(),
            projection: None,
            deferred: false,
        }
    }

    /// Sets the key field used for projection and task naming.
    #[must_use]
    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }

    /// Sets the space-separated list of fields to project into the
    /// sub-pipeline instead of cloning the whole document.
    #[must_use]
    pub fn with_projection(mut self, columns: impl Into<String>) -> Self {
        self.projection = Some(columns.into());
        self
    }

    /// Switches to deferred dispatch through the scheduler.
    #[must_use]
    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Builds the single-document batch fed to the sub-pipeline: either a
    /// projection of the configured fields plus the key field, or a clone.
    fn feed_document(&self, document: &Document) -> Document {
        match &self.projection {
            Some(columns) => {
                let mut doc = Document::new();
                doc.merge_query(document, &format!("{columns} {}", self.key_field));
                doc
            }
            None => document.clone(),
        }
    }

    /// Drives the mode over an input stream.
    ///
    /// The sub-pipeline runs exactly once per input document. In immediate
    /// dispatch a sub-pipeline failure surfaces in-stream; in deferred
    /// dispatch the background task owns its batch and failures are logged
    /// by the task itself, invisible to the caller by contract.
    #[must_use]
    pub fn run(&self, input: DocStream) -> DocStream {
        let mode = self.clone();
        input
            .then(move |item| {
                let mode = mode.clone();
                async move {
                    let document = item?;
                    let fed = mode.feed_document(&document);

                    if mode.deferred {
                        let task_name = format!("etl-{}", fed.text_of(&mode.key_field));
                        let transform = Arc::clone(&mode.transform);
                        let work = async move {
                            match transform.run_batch(vec![fed]).await {
                                Ok(produced) => produced,
                                Err(e) => {
                                    warn!(error = %e, "deferred sub-pipeline run failed");
                                    Vec::new()
                                }
                            }
                        }
                        .boxed();
                        mode.scheduler.register_background_task(&task_name, work);
                    } else {
                        // Side effects only; the produced batch is dropped.
                        let _ = mode.transform.run_batch(vec![fed]).await?;
                    }

                    Ok(document)
                }
            })
            .boxed()
    }
}

impl std::fmt::Debug for Execute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execute")
            .field("stages", &self.transform.stage_count())
            .field("key_field", &self.key_field)
            .field("projection", &self.projection)
            .field("deferred", &self.deferred)
            .finish()
    }
}
