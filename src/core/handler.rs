//! Pluggable handling of task execution failures.

use tracing::error;

use super::error::TaskFailure;

/// Receives failures raised by `Task::run` on worker threads.
///
/// Called synchronously from the worker that observed the failure, so a slow
/// handler stalls that worker. Closures of the form `Fn(&TaskFailure, &str)`
/// implement this trait.
pub trait TaskExceptionHandler: Send + Sync + 'static {
    /// Handle `failure` raised by the task identified by `task_id`.
    fn handle(&self, failure: &TaskFailure, task_id: &str);
}

impl<F> TaskExceptionHandler for F
where
    F: Fn(&TaskFailure, &str) + Send + Sync + 'static,
{
    fn handle(&self, failure: &TaskFailure, task_id: &str) {
        self(failure, task_id);
    }
}

/// Default handler: logs the failure and lets the task back off.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExceptionHandler;

impl TaskExceptionHandler for LoggingExceptionHandler {
    fn handle(&self, failure: &TaskFailure, task_id: &str) {
        error!(task_id = %task_id, error = %failure, "Error occurred while processing task");
    }
}
