//! The sequencer thread: applies add/remove requests one at a time.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, warn};

use super::{EngineCore, EngineCounters};
use crate::core::error::TaskFailure;
use crate::core::record::TaskRecord;
use crate::core::task::{Task, TaskId};

/// A structural change queued for the sequencer.
pub(crate) enum Command<T: ?Sized> {
    /// Admit a task.
    Add(Arc<T>),
    /// Remove the task with this id.
    Remove(TaskId),
    /// Signal once every earlier command has been applied.
    Flush(Sender<()>),
}

/// Apply commands in arrival order until every sender is gone.
pub(crate) fn run_sequencer<T: Task + ?Sized>(core: &EngineCore<T>, commands: &Receiver<Command<T>>) {
    debug!("Sequencer thread started");

    for command in commands {
        match command {
            Command::Add(task) => apply_add(core, task),
            Command::Remove(id) => apply_remove(core, &id),
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Sequencer thread exiting");
}

fn apply_add<T: Task + ?Sized>(core: &EngineCore<T>, task: Arc<T>) {
    if core.registry.contains(task.id()) {
        debug!(task_id = %task.id(), "Task already registered; ignoring add request");
        return;
    }

    // The admission hook completes before any worker can see the task.
    let admitted = panic::catch_unwind(AssertUnwindSafe(|| task.on_admit()));
    let failure = match admitted {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(TaskFailure::Error(err)),
        Err(payload) => Some(TaskFailure::from_panic(payload.as_ref())),
    };
    if let Some(failure) = failure {
        EngineCounters::bump(&core.counters.rejected);
        error!(task_id = %task.id(), error = %failure, "Error occurred while adding task");
        return;
    }

    let record = Arc::new(TaskRecord::new(task));
    core.registry.insert(Arc::clone(&record));
    core.queue.offer(Arc::clone(&record));
    EngineCounters::bump(&core.counters.admitted);

    debug!(
        task_id = %record.id(),
        total_tasks = core.registry.len(),
        "Task added"
    );
}

fn apply_remove<T: Task + ?Sized>(core: &EngineCore<T>, id: &str) {
    let Some(record) = core.registry.remove(id) else {
        warn!(task_id = %id, "Remove requested for unknown task");
        return;
    };

    record.disable();
    EngineCounters::bump(&core.counters.removed);

    // Queued records retire now; an in-flight record is retired by its
    // worker once the execution finishes.
    if core.queue.purge(&record) {
        core.retire(&record);
    }

    debug!(
        task_id = %id,
        total_tasks = core.registry.len(),
        "Task removed"
    );
}
