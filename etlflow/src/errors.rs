//! Error types for the etlflow engine.
//!
//! The taxonomy is deliberately small: a missing named pipeline is fatal
//! configuration, stage failures propagate untranslated to the invocation
//! mode's caller, and malformed range expressions never become errors at all
//! (they degrade to the full range via the diagnostic sink).

use thiserror::Error;

/// The main error type for etlflow operations.
#[derive(Debug, Error)]
pub enum EtlflowError {
    /// A named sub-pipeline could not be resolved. Fatal at initialization:
    /// a sub-pipeline reference is required configuration, not optional.
    #[error("no pipeline named '{name}' is registered")]
    PipelineNotFound {
        /// The pipeline name that failed to resolve.
        name: String,
    },

    /// A pipeline handle failed to load its stage list.
    #[error("failed to load pipeline '{name}': {message}")]
    PipelineLoad {
        /// The pipeline name.
        name: String,
        /// What went wrong during loading.
        message: String,
    },

    /// A stage raised an error while processing a batch. Never masked by the
    /// engine; it surfaces to whoever is consuming the invocation mode.
    #[error("stage '{stage}' failed: {message}")]
    StageExecution {
        /// The name of the failing stage.
        stage: String,
        /// The stage's error message.
        message: String,
    },

    /// A generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EtlflowError {
    /// Creates a stage execution error.
    #[must_use]
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageExecution {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates a pipeline-not-found error.
    #[must_use]
    pub fn pipeline_not_found(name: impl Into<String>) -> Self {
        Self::PipelineNotFound { name: name.into() }
    }
}
