//! The generate invocation mode.

use crate::compose::ComposedTransform;
use crate::document::Document;
use crate::stage::{docs_to_stream, DocStream, StageKind};
use futures::stream::{self, StreamExt};

/// Pure generation: drive a sub-pipeline to produce a lazy document
/// sequence from an optional seed.
///
/// The sequence is finite, driven to completion by the sub-pipeline's own
/// termination, and not restartable; rebuild the mode from a fresh
/// composed transform to regenerate.
#[derive(Debug, Clone)]
pub struct Generate {
    transform: ComposedTransform,
}

impl Generate {
    /// The capability this mode reports.
    pub const KIND: StageKind = StageKind::Generator;

    /// Creates the mode over a composed transform.
    #[must_use]
    pub fn new(transform: ComposedTransform) -> Self {
        Self { transform }
    }

    /// Returns the expected element count, if known up front.
    ///
    /// Sub-pipeline output size depends on data, so this is always unknown.
    #[must_use]
    pub fn count_hint(&self) -> Option<usize> {
        None
    }

    /// Produces the generated sequence.
    ///
    /// An empty stage selection short-circuits to the empty stream: an
    /// empty sub-pipeline reference means "nothing to generate", for any
    /// seed. Otherwise the composed transform is applied to a one-element
    /// batch holding the seed (or to no input at all), preserving the
    /// sub-pipeline's internal emission order.
    #[must_use]
    pub fn run(&self, seed: Option<Document>) -> DocStream {
        if self.transform.is_empty() {
            return stream::empty().boxed();
        }
        self.transform
            .apply(docs_to_stream(seed.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::StageSelection;
    use crate::stage::{FnStage, Stage};
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn fan_out_stage(copies: usize) -> Arc<dyn Stage> {
        Arc::new(FnStage::new(
            "fan-out",
            StageKind::Generator,
            move |batch, _| {
                let mut out = Vec::new();
                if batch.is_empty() {
                    for i in 0..copies {
                        let mut d = Document::new();
                        d.set("index", i);
                        out.push(d);
                    }
                } else {
                    for d in batch {
                        for i in 0..copies {
                            let mut copy = d.clone();
                            copy.set("index", i);
                            out.push(copy);
                        }
                    }
                }
                Ok(out)
            },
        ))
    }

    #[tokio::test]
    async fn test_empty_selection_generates_nothing() {
        let generate = Generate::new(StageSelection::default().compose(true));

        let mut seed = Document::new();
        seed.set("k", "v");
        let out: Vec<Document> = generate.run(Some(seed)).try_collect().await.unwrap();
        assert!(out.is_empty());

        let out: Vec<Document> = generate.run(None).try_collect().await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_generates_from_seed_in_order() {
        let selection = StageSelection::new(vec![fan_out_stage(3)]);
        let generate = Generate::new(selection.compose(true));

        let mut seed = Document::new();
        seed.set("url", "https://example.com");
        let out: Vec<Document> = generate.run(Some(seed)).try_collect().await.unwrap();

        assert_eq!(out.len(), 3);
        for (i, d) in out.iter().enumerate() {
            assert_eq!(d.text_of("index"), i.to_string());
            assert_eq!(d.text_of("url"), "https://example.com");
        }
    }

    #[tokio::test]
    async fn test_generates_ex_nihilo_without_seed() {
        let selection = StageSelection::new(vec![fan_out_stage(2)]);
        let generate = Generate::new(selection.compose(false));

        let out: Vec<Document> = generate.run(None).try_collect().await.unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_count_hint_is_unknown() {
        let generate = Generate::new(StageSelection::default().compose(true));
        assert_eq!(generate.count_hint(), None);
        assert_eq!(Generate::KIND, StageKind::Generator);
    }
}
