//! Drive async task bodies from the scheduler's worker threads.
//!
//! The scheduler is thread-based: a worker owns a task for the duration of
//! one `run`. [`BlockingTask`] bridges an [`AsyncTask`] onto that model by
//! giving each task its own current-thread Tokio runtime and blocking on it.
//! Timers and I/O spawned by the task live on that runtime.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::{Builder, Runtime};

use crate::core::{EngineError, Task, TaskHint, TaskResult};

/// Async counterpart of [`Task`].
#[async_trait]
pub trait AsyncTask: Send + Sync + 'static {
    /// Unique, immutable identifier.
    fn id(&self) -> &str;

    /// Admission hook. An error rejects the task.
    async fn on_admit(&self) -> TaskResult<()> {
        Ok(())
    }

    /// Removal hook. Errors are logged.
    async fn on_remove(&self) -> TaskResult<()> {
        Ok(())
    }

    /// Execute one step of work.
    async fn run(&self) -> TaskResult<TaskHint>;

    /// Backoff applied after an `Idle` result.
    fn base_delay(&self) -> Option<Duration> {
        None
    }
}

/// Adapts an [`AsyncTask`] into a [`Task`].
///
/// Must not be dropped from inside an async context: dropping the owned
/// runtime there panics.
pub struct BlockingTask<A> {
    inner: A,
    runtime: Runtime,
}

impl<A: AsyncTask> BlockingTask<A> {
    /// Wrap `inner` with a dedicated current-thread runtime.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Runtime` if the runtime cannot be built.
    pub fn new(inner: A) -> Result<Self, EngineError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EngineError::Runtime(format!("task {}: {e}", inner.id())))?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async task.
    pub const fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: AsyncTask> Task for BlockingTask<A> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn on_admit(&self) -> TaskResult<()> {
        self.runtime.block_on(self.inner.on_admit())
    }

    fn on_remove(&self) -> TaskResult<()> {
        self.runtime.block_on(self.inner.on_remove())
    }

    fn run(&self) -> TaskResult<TaskHint> {
        self.runtime.block_on(self.inner.run())
    }

    fn base_delay(&self) -> Option<Duration> {
        self.inner.base_delay()
    }
}

impl<A: AsyncTask> fmt::Debug for BlockingTask<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingTask")
            .field("id", &self.inner.id())
            .finish_non_exhaustive()
    }
}
