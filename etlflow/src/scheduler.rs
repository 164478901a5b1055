//! Fire-and-forget background task scheduling.
//!
//! The deferred sub-mode of the Execute invocation hands a named unit of
//! work to a scheduler and returns without waiting. The engine never awaits
//! completion and never inspects the result; the document batch inside the
//! work is exclusively owned by the dispatched task from the moment of
//! hand-off.

use crate::document::Document;
use futures::future::BoxFuture;
use tracing::debug;

/// A unit of background work producing a document batch that is consumed
/// and discarded by the scheduler.
pub type TaskWork = BoxFuture<'static, Vec<Document>>;

/// Trait for background task schedulers.
pub trait TaskScheduler: Send + Sync {
    /// Registers named work for independent execution. Fire-and-forget: the
    /// caller gets no handle and no result.
    fn register_background_task(&self, name: &str, work: TaskWork);
}

/// A scheduler backed by the tokio runtime.
///
/// Spawned work runs to completion on the runtime; its output is drained
/// and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TaskScheduler for TokioScheduler {
    fn register_background_task(&self, name: &str, work: TaskWork) {
        let task_name = name.to_string();
        tokio::spawn(async move {
            let produced = work.await;
            debug!(
                task = %task_name,
                count = produced.len(),
                "background task finished"
            );
        });
    }
}

/// A recording scheduler for testing purposes.
///
/// Captures registrations instead of running them; tests can drive the
/// captured work manually.
#[derive(Default)]
pub struct RecordingScheduler {
    tasks: parking_lot::Mutex<Vec<(String, TaskWork)>>,
}

impl RecordingScheduler {
    /// Creates a new recording scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all registered tasks.
    #[must_use]
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Returns the number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns true if no tasks were registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Takes the registered tasks, leaving the scheduler empty.
    #[must_use]
    pub fn take_tasks(&self) -> Vec<(String, TaskWork)> {
        std::mem::take(&mut *self.tasks.lock())
    }
}

impl TaskScheduler for RecordingScheduler {
    fn register_background_task(&self, name: &str, work: TaskWork) {
        self.tasks.lock().push((name.to_string(), work));
    }
}
