use std::sync::Arc;
use std::time::Duration;

use celery_core::{CeleryError, ResultBackend};
use celery_message::ResultEnvelope;
use uuid::Uuid;

/// A handle to the eventual result of one [`Task::apply_async`](crate::Task::apply_async) call.
///
/// Cloning an `AsyncResult` is cheap; every clone observes the same
/// underlying task.
#[derive(Clone)]
pub struct AsyncResult {
    task_id: Uuid,
    backend: Arc<dyn ResultBackend>,
}

impl AsyncResult {
    pub(crate) fn new(task_id: Uuid, backend: Arc<dyn ResultBackend>) -> Self {
        Self { task_id, backend }
    }

    /// The UUID correlating this result with the task that produced it.
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Awaits the task's result envelope, optionally bounded by `timeout`.
    pub async fn get(&self, timeout: Option<Duration>) -> Result<ResultEnvelope, CeleryError> {
        self.backend.get(self.task_id, timeout).await
    }

    /// Deletes this task's stored result, if the backend retains one.
    pub async fn forget(&self) -> String {
        self.backend.delete(self.task_id).await
    }
}
