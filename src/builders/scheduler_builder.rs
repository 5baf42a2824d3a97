//! Builder assembling a `Scheduler` from configuration and strategies.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::core::{
    EngineError, LoggingExceptionHandler, NamedThreadFactory, Scheduler, Task,
    TaskExceptionHandler, ThreadFactory,
};

/// Step-by-step construction of a [`Scheduler`].
///
/// ```rust,ignore
/// let scheduler: Scheduler = SchedulerBuilder::new()
///     .with_worker_count(4)
///     .with_idle_delay(Duration::from_millis(20))
///     .with_exception_handler(|failure: &TaskFailure, id: &str| eprintln!("{id}: {failure}"))
///     .build()?;
/// ```
pub struct SchedulerBuilder<T: Task + ?Sized = dyn Task> {
    config: SchedulerConfig,
    thread_factory: Option<Arc<dyn ThreadFactory>>,
    handler: Option<Arc<dyn TaskExceptionHandler>>,
    _task: PhantomData<fn() -> Box<T>>,
}

impl<T: Task + ?Sized> Default for SchedulerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task + ?Sized> SchedulerBuilder<T> {
    /// Builder starting from `SchedulerConfig::new()`.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(SchedulerConfig::new())
    }

    /// Builder starting from `config`.
    #[must_use]
    pub const fn from_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            thread_factory: None,
            handler: None,
            _task: PhantomData,
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.config.worker_count = worker_count;
        self
    }

    /// Backoff after `Idle` results for tasks without their own base delay.
    #[must_use]
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_idle_delay(delay);
        self
    }

    /// Thread-creation strategy. Replaces the name prefix and stack size
    /// from the configuration.
    #[must_use]
    pub fn with_thread_factory<F: ThreadFactory>(mut self, factory: F) -> Self {
        self.thread_factory = Some(Arc::new(factory));
        self
    }

    /// Initial exception handler.
    #[must_use]
    pub fn with_exception_handler<H: TaskExceptionHandler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Configuration the scheduler will be built with.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and start the scheduler's sequencer.
    ///
    /// # Errors
    ///
    /// - `EngineError::InvalidConfig` if the configuration is invalid
    /// - `EngineError::ThreadSpawn` if the sequencer thread cannot be spawned
    pub fn build(self) -> Result<Scheduler<T>, EngineError> {
        let thread_factory: Arc<dyn ThreadFactory> = match self.thread_factory {
            Some(factory) => factory,
            None => Arc::new(NamedThreadFactory::from_config(&self.config)),
        };
        let handler: Arc<dyn TaskExceptionHandler> = match self.handler {
            Some(handler) => handler,
            None => Arc::new(LoggingExceptionHandler),
        };

        Scheduler::assemble(self.config, thread_factory, handler)
    }
}
