//! Worker loop: take a due record, run it, put it back.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::debug;

use super::EngineCore;
use crate::core::task::Task;
use crate::core::thread_factory::{ThreadFactory, ThreadKind};

/// A worker thread attached to the ready queue.
pub(crate) struct Worker {
    id: usize,
    active: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Spawn worker `id` through `factory`.
    pub fn spawn<T: Task + ?Sized>(
        id: usize,
        core: Arc<EngineCore<T>>,
        factory: &dyn ThreadFactory,
    ) -> io::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let handle = factory.spawn(
            ThreadKind::Worker(id),
            Box::new(move || run_worker(id, &core, &flag)),
        )?;
        Ok(Self { id, active, handle })
    }

    /// Ask the worker to exit after its current iteration. Callers must wake
    /// the ready queue afterwards so an idle worker notices.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub const fn id(&self) -> usize {
        self.id
    }

    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

fn run_worker<T: Task + ?Sized>(worker_id: usize, core: &EngineCore<T>, active: &AtomicBool) {
    debug!(worker_id = worker_id, "Worker thread started");

    while active.load(Ordering::Acquire) {
        let Some(record) = core.queue.take_due(active) else {
            break;
        };

        // Removed while waiting in the queue.
        if !record.is_enabled() {
            core.retire(&record);
            continue;
        }

        let hint = core.execute(&record);
        record.reschedule_after(hint, core.idle_delay, Instant::now());

        // Removed while executing.
        if !record.is_enabled() {
            core.retire(&record);
            continue;
        }

        core.queue.offer(Arc::clone(&record));

        // A removal landing between the check above and the offer missed the
        // record in the queue; pull it back out ourselves.
        if !record.is_enabled() && core.queue.purge(&record) {
            core.retire(&record);
        }
    }

    debug!(worker_id = worker_id, "Worker thread exiting");
}
