//! Named pipeline lookup.
//!
//! The engine never holds pipeline names past initialization: a name is
//! resolved once through an injected registry into a handle, and the handle
//! is what callers keep. A missing name is fatal configuration, not a
//! recoverable condition.

use crate::errors::EtlflowError;
use crate::stage::Stage;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A resolved named pipeline.
#[async_trait]
pub trait PipelineHandle: Send + Sync + fmt::Debug {
    /// Returns the pipeline's name.
    fn name(&self) -> &str;

    /// Ensures the pipeline's stage list is loaded.
    ///
    /// May trigger lazy loading of the target pipeline; stage access is only
    /// valid after this returns.
    async fn ensure_loaded(&self) -> Result<(), EtlflowError>;

    /// Returns the pipeline's ordered stage list.
    fn stages(&self) -> Vec<Arc<dyn Stage>>;
}

/// Lookup from a pipeline name to its handle.
#[async_trait]
pub trait PipelineRegistry: Send + Sync {
    /// Resolves a pipeline by name.
    ///
    /// # Errors
    ///
    /// Returns [`EtlflowError::PipelineNotFound`] if no pipeline with that
    /// name is registered.
    async fn find_pipeline(&self, name: &str) -> Result<Arc<dyn PipelineHandle>, EtlflowError>;
}

/// A handle over an already-loaded stage list.
#[derive(Debug, Clone)]
pub struct StaticHandle {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl StaticHandle {
    /// Creates a handle over the given stages.
    #[must_use]
    pub fn new(name: impl Into<String>, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            name: name.into(),
            stages,
        }
    }
}

#[async_trait]
impl PipelineHandle for StaticHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_loaded(&self) -> Result<(), EtlflowError> {
        Ok(())
    }

    fn stages(&self) -> Vec<Arc<dyn Stage>> {
        self.stages.clone()
    }
}

/// An in-memory pipeline registry.
#[derive(Default)]
pub struct InMemoryRegistry {
    pipelines: RwLock<HashMap<String, Arc<dyn PipelineHandle>>>,
}

impl InMemoryRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pipeline under its stage list, replacing any previous
    /// pipeline with the same name.
    pub fn register(&self, name: impl Into<String>, stages: Vec<Arc<dyn Stage>>) {
        let name = name.into();
        let handle = Arc::new(StaticHandle::new(name.clone(), stages));
        self.pipelines.write().insert(name, handle);
    }

    /// Registers a custom handle.
    pub fn register_handle(&self, handle: Arc<dyn PipelineHandle>) {
        self.pipelines
            .write()
            .insert(handle.name().to_string(), handle);
    }

    /// Lists the registered pipeline names.
    #[must_use]
    pub fn pipeline_names(&self) -> Vec<String> {
        self.pipelines.read().keys().cloned().collect()
    }
}

#[async_trait]
impl PipelineRegistry for InMemoryRegistry {
    async fn find_pipeline(&self, name: &str) -> Result<Arc<dyn PipelineHandle>, EtlflowError> {
        self.pipelines
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EtlflowError::pipeline_not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{FnStage, StageKind};

    fn noop_stage(name: &str) -> Arc<dyn Stage> {
        Arc::new(FnStage::new(name, StageKind::Transformer, |batch, _| {
            Ok(batch)
        }))
    }

    #[tokio::test]
    async fn test_lookup_resolves_registered_pipeline() {
        let registry = InMemoryRegistry::new();
        registry.register("clean", vec![noop_stage("a"), noop_stage("b")]);

        let handle = registry.find_pipeline("clean").await.unwrap();
        handle.ensure_loaded().await.unwrap();
        assert_eq!(handle.name(), "clean");
        assert_eq!(handle.stages().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_missing_pipeline_is_fatal() {
        let registry = InMemoryRegistry::new();

        let err = registry.find_pipeline("absent").await.unwrap_err();
        assert!(matches!(
            err,
            EtlflowError::PipelineNotFound { ref name } if name == "absent"
        ));
    }

    #[tokio::test]
    async fn test_handle_is_debuggable_through_the_trait_object() {
        let registry = InMemoryRegistry::new();
        registry.register("p", vec![noop_stage("a")]);

        let handle = registry.find_pipeline("p").await.unwrap();
        let rendered = format!("{handle:?}");
        assert!(rendered.contains("StaticHandle"));
    }

    #[tokio::test]
    async fn test_reregistering_replaces() {
        let registry = InMemoryRegistry::new();
        registry.register("p", vec![noop_stage("a")]);
        registry.register("p", vec![noop_stage("a"), noop_stage("b")]);

        let handle = registry.find_pipeline("p").await.unwrap();
        assert_eq!(handle.stages().len(), 2);
        assert_eq!(registry.pipeline_names(), vec!["p"]);
    }
}
