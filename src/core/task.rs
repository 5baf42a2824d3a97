//! The task contract implemented by broker subsystems.
//!
//! A [`Task`] is a recurring, pollable unit of work. The engine calls
//! [`Task::run`] whenever the task is due and uses the returned [`TaskHint`] to
//! decide when to call it again: immediately after useful work, or after a
//! backoff delay when there was nothing to do.
//!
//! ```rust,ignore
//! use broker_task_engine::core::{Task, TaskHint, TaskResult};
//!
//! struct DeliveryLoop {
//!     queue: String,
//! }
//!
//! impl Task for DeliveryLoop {
//!     fn id(&self) -> &str {
//!         &self.queue
//!     }
//!
//!     fn run(&self) -> TaskResult<TaskHint> {
//!         // deliver pending messages...
//!         Ok(TaskHint::Idle)
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use super::error::TaskResult;

/// Identifier of a task. Unique within one scheduler.
pub type TaskId = String;

/// Outcome of one task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskHint {
    /// Useful work was done; run again as soon as possible.
    Active,
    /// Nothing to do; back off before running again.
    Idle,
}

/// A recurring unit of work driven by the scheduler.
///
/// Methods take `&self`: the scheduler shares the task with callers of
/// `Scheduler::get`, so mutable state lives behind interior mutability.
/// A task never runs on two workers at the same time.
pub trait Task: Send + Sync + 'static {
    /// Unique, immutable identifier.
    fn id(&self) -> &str;

    /// Admission hook. Runs once before the task becomes schedulable; an error
    /// rejects the task.
    ///
    /// # Errors
    ///
    /// Any error aborts admission and the task is not registered.
    fn on_admit(&self) -> TaskResult<()> {
        Ok(())
    }

    /// Removal hook. Runs once after the task has been taken out of rotation.
    ///
    /// # Errors
    ///
    /// Errors are logged; the removal stands.
    fn on_remove(&self) -> TaskResult<()> {
        Ok(())
    }

    /// Execute one step of work.
    ///
    /// # Errors
    ///
    /// Errors are routed to the scheduler's exception handler and the task is
    /// rescheduled as if it had returned [`TaskHint::Idle`].
    fn run(&self) -> TaskResult<TaskHint>;

    /// Backoff applied after an `Idle` result. `None` uses the scheduler's
    /// configured idle delay.
    fn base_delay(&self) -> Option<Duration> {
        None
    }
}

/// Closure-backed task wrapping a fallible action.
///
/// Handy for housekeeping jobs that do not need their own type.
pub struct FnTask<F> {
    id: TaskId,
    action: F,
    base_delay: Option<Duration>,
}

impl<F> FnTask<F>
where
    F: Fn() -> TaskResult<TaskHint> + Send + Sync + 'static,
{
    /// Wrap `action` under the given id.
    pub fn new(id: impl Into<TaskId>, action: F) -> Self {
        Self {
            id: id.into(),
            action,
            base_delay: None,
        }
    }

    /// Use `delay` instead of the scheduler's idle delay after `Idle` results.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }
}

impl<F> Task for FnTask<F>
where
    F: Fn() -> TaskResult<TaskHint> + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self) -> TaskResult<TaskHint> {
        (self.action)()
    }

    fn base_delay(&self) -> Option<Duration> {
        self.base_delay
    }
}

impl<F> fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask")
            .field("id", &self.id)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}
