//! Task contract, scheduling state, and the scheduler itself.

pub mod error;
pub mod handler;
pub mod ready_queue;
pub mod record;
pub mod registry;
pub mod scheduler;
pub mod task;
pub mod thread_factory;

pub use error::{EngineError, TaskFailure, TaskResult};
pub use handler::{LoggingExceptionHandler, TaskExceptionHandler};
pub use ready_queue::ReadyQueue;
pub use record::{TaskRecord, MAX_BACKOFF};
pub use registry::Registry;
pub use scheduler::{Scheduler, SchedulerStats, SHUTDOWN_TIMEOUT};
pub use task::{FnTask, Task, TaskHint, TaskId};
pub use thread_factory::{NamedThreadFactory, ThreadFactory, ThreadKind};
