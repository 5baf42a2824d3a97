//! Scheduling state wrapped around a registered task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::task::{Task, TaskHint};

/// Longest backoff applied after an `Idle` result (about 136 years). Larger
/// delays are clamped so the due time stays representable.
pub const MAX_BACKOFF: Duration = Duration::from_secs(4_294_967_295);

/// A task plus the state the engine needs to schedule it.
///
/// Shared between the registry and the ready queue, but only one actor
/// touches the due time at a time: the sequencer while admitting, or the
/// worker currently executing the task.
pub struct TaskRecord<T: ?Sized> {
    task: Arc<T>,
    due_at: Mutex<Instant>,
    enabled: AtomicBool,
    retired: AtomicBool,
}

impl<T: Task + ?Sized> TaskRecord<T> {
    /// Wrap `task`, due immediately.
    pub fn new(task: Arc<T>) -> Self {
        Self::due_at(task, Instant::now())
    }

    /// Wrap `task`, due at `due`.
    pub fn due_at(task: Arc<T>, due: Instant) -> Self {
        Self {
            task,
            due_at: Mutex::new(due),
            enabled: AtomicBool::new(true),
            retired: AtomicBool::new(false),
        }
    }

    /// The wrapped task.
    pub const fn task(&self) -> &Arc<T> {
        &self.task
    }

    /// Id of the wrapped task.
    pub fn id(&self) -> &str {
        self.task.id()
    }

    /// Instant at which the record becomes eligible to run.
    pub fn due(&self) -> Instant {
        *self.due_at.lock()
    }

    /// Whether the record may still be dispatched.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Take the record out of rotation. One-way; repeated calls are no-ops.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Compute and store the next due time after an execution that returned
    /// `hint`, measured from `now`. `Idle` waits for the task's own base delay,
    /// or `default_delay` when the task has none, clamped to [`MAX_BACKOFF`].
    pub fn reschedule_after(&self, hint: TaskHint, default_delay: Duration, now: Instant) -> Instant {
        let next = match hint {
            TaskHint::Active => now,
            TaskHint::Idle => {
                let delay = self.task.base_delay().unwrap_or(default_delay).min(MAX_BACKOFF);
                now.checked_add(delay).unwrap_or(now)
            }
        };
        *self.due_at.lock() = next;
        next
    }

    /// Claim the right to deliver the removal notification. Returns `true`
    /// exactly once per record, and only after it has been disabled.
    pub(crate) fn claim_retirement(&self) -> bool {
        !self.is_enabled() && !self.retired.swap(true, Ordering::AcqRel)
    }
}

impl<T: Task + ?Sized> std::fmt::Debug for TaskRecord<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id())
            .field("due", &self.due())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
