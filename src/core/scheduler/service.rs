//! The public scheduler handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::sequencer::{run_sequencer, Command};
use super::worker::Worker;
use super::{EngineCore, SchedulerStats};
use crate::config::SchedulerConfig;
use crate::core::error::EngineError;
use crate::core::handler::{LoggingExceptionHandler, TaskExceptionHandler};
use crate::core::task::{Task, TaskId};
use crate::core::thread_factory::{NamedThreadFactory, ThreadFactory, ThreadKind};

/// Upper bound `shutdown` waits for engine threads to terminate.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of joining one thread against a deadline.
enum JoinOutcome {
    Joined,
    Panicked,
    TimedOut,
}

/// Schedules recurring tasks onto a fixed pool of worker threads.
///
/// `T` is the task type; the default `dyn Task` lets unrelated task types
/// share one scheduler. Every instance is independent: it owns its registry,
/// ready queue, workers and sequencer thread.
///
/// # Design
///
/// - **No polling**: workers block on the ready queue's Condvar until the
///   earliest task is due
/// - **Serialized mutations**: add/remove go through one sequencer thread
/// - **Non-preemptive removal**: a running task finishes its current step
///   but is never dispatched again
pub struct Scheduler<T: Task + ?Sized = dyn Task> {
    config: SchedulerConfig,
    core: Arc<EngineCore<T>>,
    /// Request channel to the sequencer. `None` once shut down.
    commands: Mutex<Option<Sender<Command<T>>>>,
    sequencer: Mutex<Option<JoinHandle<()>>>,
    /// Workers attached to the queue.
    workers: Mutex<Vec<Worker>>,
    /// Workers told to stop but not yet joined.
    stopped: Mutex<Vec<Worker>>,
    thread_factory: Arc<dyn ThreadFactory>,
    next_worker_id: AtomicUsize,
    instance_id: Uuid,
}

impl<T: Task + ?Sized> Scheduler<T> {
    /// Create a scheduler from configuration, with named threads and the
    /// logging exception handler.
    ///
    /// The sequencer thread starts immediately; workers start with
    /// [`Scheduler::start`].
    ///
    /// # Errors
    ///
    /// - `EngineError::InvalidConfig` if the configuration is invalid
    /// - `EngineError::ThreadSpawn` if the sequencer thread cannot be spawned
    pub fn new(config: SchedulerConfig) -> Result<Self, EngineError> {
        let factory = NamedThreadFactory::from_config(&config);
        Self::assemble(config, Arc::new(factory), Arc::new(LoggingExceptionHandler))
    }

    pub(crate) fn assemble(
        config: SchedulerConfig,
        thread_factory: Arc<dyn ThreadFactory>,
        handler: Arc<dyn TaskExceptionHandler>,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let core = Arc::new(EngineCore::new(config.idle_delay(), handler));
        let (tx, rx) = unbounded::<Command<T>>();

        let sequencer = {
            let core = Arc::clone(&core);
            thread_factory
                .spawn(ThreadKind::Sequencer, Box::new(move || run_sequencer(&core, &rx)))
                .map_err(|e| EngineError::ThreadSpawn(format!("sequencer: {e}")))?
        };

        let instance_id = Uuid::new_v4();
        info!(
            instance_id = %instance_id,
            worker_count = config.worker_count,
            idle_delay_ms = config.idle_delay_ms,
            "Task scheduler created"
        );

        Ok(Self {
            config,
            core,
            commands: Mutex::new(Some(tx)),
            sequencer: Mutex::new(Some(sequencer)),
            workers: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            thread_factory,
            next_worker_id: AtomicUsize::new(0),
            instance_id,
        })
    }

    /// Request admission of `task`. Returns immediately.
    ///
    /// The sequencer runs the task's admission hook and then publishes it.
    /// A task whose id is already registered is ignored; admission failures
    /// are logged, never returned.
    pub fn add(&self, task: Arc<T>) {
        debug!(instance_id = %self.instance_id, task_id = %task.id(), "Task add request");
        self.submit(Command::Add(task));
    }

    /// Request removal of the task with `id`. Returns immediately.
    ///
    /// An execution already in progress runs to completion; the task is not
    /// dispatched again once the removal is applied.
    pub fn remove(&self, id: &str) {
        debug!(instance_id = %self.instance_id, task_id = %id, "Task remove request");
        self.submit(Command::Remove(id.to_string()));
    }

    /// Block until every add/remove submitted before this call has been
    /// applied. Returns immediately after shutdown.
    ///
    /// Must not be called from a task's admission or removal hook, which run
    /// on the sequencer thread.
    pub fn flush(&self) {
        let (done_tx, done_rx) = bounded(1);
        if self.submit(Command::Flush(done_tx)) {
            // Err means the sequencer exited before reaching the barrier.
            let _ = done_rx.recv();
        }
    }

    fn submit(&self, command: Command<T>) -> bool {
        let commands = self.commands.lock();
        let Some(tx) = commands.as_ref() else {
            warn!(instance_id = %self.instance_id, "Task scheduler is shut down; ignoring request");
            return false;
        };
        if tx.send(command).is_err() {
            error!(instance_id = %self.instance_id, "Sequencer thread is gone; ignoring request");
            return false;
        }
        true
    }

    /// The registered task with `id`, if any.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.core.registry.get(id).map(|record| Arc::clone(record.task()))
    }

    /// Ids of all registered tasks.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.core.registry.ids()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.core.registry.len()
    }

    /// Whether no task is registered.
    pub fn is_empty(&self) -> bool {
        self.core.registry.is_empty()
    }

    /// Identifier of this scheduler instance, as it appears in logs.
    pub const fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Configuration the scheduler was built with.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Spawn `worker_count` workers against the ready queue.
    ///
    /// Not idempotent: each call adds another set of workers.
    pub fn start(&self) {
        let mut workers = self.workers.lock();
        info!(
            instance_id = %self.instance_id,
            task_count = self.core.queue.len(),
            "Starting task scheduler"
        );

        for _ in 0..self.config.worker_count {
            let worker_id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
            match Worker::spawn(worker_id, Arc::clone(&self.core), self.thread_factory.as_ref()) {
                Ok(worker) => workers.push(worker),
                Err(e) => error!(
                    instance_id = %self.instance_id,
                    worker_id = worker_id,
                    error = %e,
                    "Failed to spawn worker thread"
                ),
            }
        }
    }

    /// Deactivate the current workers after their current iteration.
    ///
    /// Registered and queued tasks are kept; a later [`Scheduler::start`]
    /// resumes driving them.
    pub fn stop(&self) {
        let mut workers = self.workers.lock();
        info!(
            instance_id = %self.instance_id,
            task_count = self.core.queue.len(),
            "Stopping task scheduler"
        );

        for worker in workers.iter() {
            worker.deactivate();
        }
        self.core.queue.wake_all();
        self.stopped.lock().append(&mut workers);
    }

    /// Stop all workers and tear down the sequencer, waiting at most
    /// [`SHUTDOWN_TIMEOUT`]. See [`Scheduler::shutdown_within`].
    pub fn shutdown(&self) -> bool {
        self.shutdown_within(SHUTDOWN_TIMEOUT)
    }

    /// Stop all workers and tear down the sequencer, waiting at most
    /// `timeout` for the threads to exit.
    ///
    /// Returns `true` if every thread terminated in time. Threads still busy
    /// when the bound expires (a task blocked in `run`, for instance) are
    /// detached and an error is logged; this never panics. A timeout too large
    /// to express as an instant waits without a bound.
    pub fn shutdown_within(&self, timeout: Duration) -> bool {
        self.stop();
        let deadline = Instant::now().checked_add(timeout);

        // Closing the channel lets the sequencer drain pending requests and exit.
        drop(self.commands.lock().take());

        let mut terminated = true;
        let stopped: Vec<Worker> = self.stopped.lock().drain(..).collect();
        for worker in stopped {
            let worker_id = worker.id();
            match join_before(worker.into_handle(), deadline) {
                JoinOutcome::Joined => debug!(worker_id = worker_id, "Worker joined"),
                JoinOutcome::Panicked => warn!(worker_id = worker_id, "Worker panicked"),
                JoinOutcome::TimedOut => terminated = false,
            }
        }

        if let Some(sequencer) = self.sequencer.lock().take() {
            match join_before(sequencer, deadline) {
                JoinOutcome::Joined => debug!("Sequencer joined"),
                JoinOutcome::Panicked => warn!("Sequencer panicked"),
                JoinOutcome::TimedOut => terminated = false,
            }
        }

        if terminated {
            info!(instance_id = %self.instance_id, "Task scheduler shut down");
        } else {
            error!(
                instance_id = %self.instance_id,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "Could not stop task scheduler; threads did not terminate in time"
            );
        }
        terminated
    }

    /// Replace the exception handler. Applies to failures dispatched after
    /// this call.
    pub fn set_exception_handler<H: TaskExceptionHandler>(&self, handler: H) {
        self.set_shared_exception_handler(Arc::new(handler));
    }

    /// Replace the exception handler with an already shared one.
    pub fn set_shared_exception_handler(&self, handler: Arc<dyn TaskExceptionHandler>) {
        *self.core.handler.write() = handler;
    }

    /// Current activity counters.
    pub fn stats(&self) -> SchedulerStats {
        self.core.snapshot(self.workers.lock().len())
    }
}

impl<T: Task + ?Sized> Drop for Scheduler<T> {
    fn drop(&mut self) {
        // Signal workers and close the sequencer channel, but don't join:
        // a task blocked in `run` must not hang the dropping thread.
        // Explicit shutdown() is required for graceful cleanup.
        for worker in self.workers.get_mut().iter() {
            worker.deactivate();
        }
        self.core.queue.wake_all();
        if self.commands.get_mut().take().is_some() {
            debug!(instance_id = %self.instance_id, "Task scheduler dropped without shutdown; threads detached");
        }
    }
}

/// Join `handle`, giving up at `deadline` (`None` waits indefinitely). A
/// thread that outlives the deadline is left detached.
fn join_before(handle: JoinHandle<()>, deadline: Option<Instant>) -> JoinOutcome {
    if handle.is_finished() {
        return match handle.join() {
            Ok(()) => JoinOutcome::Joined,
            Err(_) => JoinOutcome::Panicked,
        };
    }

    let thread_name = handle.thread().name().unwrap_or("engine").to_string();
    let (tx, rx) = bounded(1);
    let joiner = thread::Builder::new()
        .name(format!("{thread_name}-join"))
        .spawn(move || {
            let _ = tx.send(handle.join().is_ok());
        });
    if let Err(e) = joiner {
        error!(thread = %thread_name, error = %e, "Failed to spawn join helper; detaching thread");
        return JoinOutcome::TimedOut;
    }

    let joined = match deadline {
        Some(deadline) => rx.recv_deadline(deadline).ok(),
        None => rx.recv().ok(),
    };
    match joined {
        Some(true) => JoinOutcome::Joined,
        Some(false) => JoinOutcome::Panicked,
        None => {
            warn!(thread = %thread_name, "Thread did not exit within timeout - detaching");
            JoinOutcome::TimedOut
        }
    }
}
