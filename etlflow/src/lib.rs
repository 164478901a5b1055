//! # Etlflow
//!
//! A sub-pipeline composition and execution engine for document pipelines.
//!
//! Documents flow through named, ordered pipelines of stages. Etlflow lets
//! one stage invoke an externally named pipeline as a reusable sub-routine:
//!
//! - **Range selection**: pick a contiguous, possibly negatively-indexed
//!   slice of the sub-pipeline's stages with Python-slice syntax
//! - **Composition**: build the selected stages into a single lazy
//!   streaming transform
//! - **Invocation modes**: drive that transform as a generator, a
//!   side-effecting executor (immediate or deferred to a background
//!   scheduler), a single-pass transformer, or a cyclic self-feeding
//!   transformer
//! - **Pivot**: reshape a document batch by turning a key column's values
//!   into new column headers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use etlflow::prelude::*;
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! registry.register("detail-fetch", stages);
//!
//! let selection = SubPipelineRef::new(registry, "detail-fetch")
//!     .with_range("2:-1")
//!     .resolve()
//!     .await?;
//!
//! let mut generated = Generate::new(selection.compose(true)).run(Some(seed));
//! while let Some(document) = generated.try_next().await? {
//!     // ...
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod compose;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod modes;
pub mod pivot;
pub mod range;
pub mod registry;
pub mod scheduler;
pub mod stage;
pub mod subpipeline;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::compose::{ComposedTransform, StageSelection};
    pub use crate::diagnostics::{CollectingSink, DiagnosticSink, NoOpSink, TracingSink};
    pub use crate::document::Document;
    pub use crate::errors::EtlflowError;
    pub use crate::modes::{Execute, Generate, Transform};
    pub use crate::pivot::PivotReshaper;
    pub use crate::range::{resolve_range, StageRange};
    pub use crate::registry::{InMemoryRegistry, PipelineHandle, PipelineRegistry, StaticHandle};
    pub use crate::scheduler::{RecordingScheduler, TaskScheduler, TokioScheduler};
    pub use crate::stage::{docs_to_stream, DocStream, FnStage, Stage, StageKind};
    pub use crate::subpipeline::SubPipelineRef;
}

#[cfg(test)]
mod integration_tests;
