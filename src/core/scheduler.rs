//! Task scheduler: a fixed pool of worker threads driving recurring tasks.
//!
//! The scheduler owns a [`Registry`] of admitted tasks and a [`ReadyQueue`]
//! ordered by due time. Workers block on the queue until the earliest task
//! is due, run it once, and put it back with a new due time derived from the
//! returned [`TaskHint`]. Structural changes (`add` / `remove`) are applied
//! in submission order by a single sequencer thread, so workers and `get`
//! callers never observe a half-admitted task.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use broker_task_engine::config::SchedulerConfig;
//! use broker_task_engine::core::{FnTask, Scheduler, TaskHint};
//!
//! let scheduler: Scheduler = Scheduler::new(
//!     SchedulerConfig::new()
//!         .with_worker_count(2)
//!         .with_idle_delay(Duration::from_millis(50)),
//! )?;
//! scheduler.start();
//! scheduler.add(Arc::new(FnTask::new("housekeeping", || Ok(TaskHint::Idle))));
//! // ...
//! scheduler.remove("housekeeping");
//! scheduler.shutdown();
//! ```

mod sequencer;
mod service;
mod worker;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, error, warn};

use super::error::TaskFailure;
use super::handler::TaskExceptionHandler;
use super::ready_queue::ReadyQueue;
use super::record::TaskRecord;
use super::registry::Registry;
use super::task::{Task, TaskHint};

pub use service::{Scheduler, SHUTDOWN_TIMEOUT};

/// Snapshot of scheduler activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Workers currently attached to the ready queue.
    pub worker_count: usize,
    /// Tasks present in the registry.
    pub registered_tasks: usize,
    /// Records waiting in the ready queue.
    pub queued_tasks: usize,
    /// Total `run` invocations.
    pub executions: u64,
    /// Executions that reported `Active`.
    pub active_results: u64,
    /// Executions that reported `Idle`.
    pub idle_results: u64,
    /// Executions that failed or panicked.
    pub failures: u64,
    /// Tasks admitted.
    pub admitted: u64,
    /// Tasks whose admission hook failed.
    pub rejected: u64,
    /// Tasks removed.
    pub removed: u64,
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct EngineCounters {
    pub executions: AtomicU64,
    pub active_results: AtomicU64,
    pub idle_results: AtomicU64,
    pub failures: AtomicU64,
    pub admitted: AtomicU64,
    pub rejected: AtomicU64,
    pub removed: AtomicU64,
}

impl EngineCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// State shared by the scheduler handle, its workers and its sequencer.
pub(crate) struct EngineCore<T: ?Sized> {
    pub registry: Registry<T>,
    pub queue: ReadyQueue<T>,
    pub handler: RwLock<Arc<dyn TaskExceptionHandler>>,
    pub idle_delay: Duration,
    pub counters: EngineCounters,
}

impl<T: Task + ?Sized> EngineCore<T> {
    pub fn new(idle_delay: Duration, handler: Arc<dyn TaskExceptionHandler>) -> Self {
        Self {
            registry: Registry::new(),
            queue: ReadyQueue::new(),
            handler: RwLock::new(handler),
            idle_delay,
            counters: EngineCounters::default(),
        }
    }

    /// Run the task once inside a failure boundary. Failures are reported to
    /// the exception handler and count as `Idle`.
    pub fn execute(&self, record: &TaskRecord<T>) -> TaskHint {
        EngineCounters::bump(&self.counters.executions);
        let task = record.task();

        let failure = match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
            Ok(Ok(hint)) => {
                match hint {
                    TaskHint::Active => EngineCounters::bump(&self.counters.active_results),
                    TaskHint::Idle => EngineCounters::bump(&self.counters.idle_results),
                }
                return hint;
            }
            Ok(Err(err)) => TaskFailure::Error(err),
            Err(payload) => TaskFailure::from_panic(payload.as_ref()),
        };

        EngineCounters::bump(&self.counters.failures);
        self.report_failure(&failure, record.id());
        TaskHint::Idle
    }

    fn report_failure(&self, failure: &TaskFailure, task_id: &str) {
        let handler = Arc::clone(&*self.handler.read());
        if panic::catch_unwind(AssertUnwindSafe(|| handler.handle(failure, task_id))).is_err() {
            error!(task_id = %task_id, "Task exception handler panicked");
        }
    }

    /// Deliver the removal notification for a disabled record. Only the first
    /// caller for a given record invokes `on_remove`.
    pub fn retire(&self, record: &TaskRecord<T>) {
        if !record.claim_retirement() {
            return;
        }

        let task = record.task();
        match panic::catch_unwind(AssertUnwindSafe(|| task.on_remove())) {
            Ok(Ok(())) => debug!(task_id = %record.id(), "Task retired"),
            Ok(Err(err)) => warn!(
                task_id = %record.id(),
                error = %format!("{err:#}"),
                "Error occurred while notifying task removal"
            ),
            Err(payload) => warn!(
                task_id = %record.id(),
                error = %TaskFailure::from_panic(payload.as_ref()),
                "Task removal hook panicked"
            ),
        }
    }

    pub fn snapshot(&self, worker_count: usize) -> SchedulerStats {
        SchedulerStats {
            worker_count,
            registered_tasks: self.registry.len(),
            queued_tasks: self.queue.len(),
            executions: self.counters.executions.load(Ordering::Relaxed),
            active_results: self.counters.active_results.load(Ordering::Relaxed),
            idle_results: self.counters.idle_results.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            admitted: self.counters.admitted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            removed: self.counters.removed.load(Ordering::Relaxed),
        }
    }
}
