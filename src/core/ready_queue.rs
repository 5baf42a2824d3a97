//! Delay-ordered blocking queue feeding the workers.
//!
//! Records are kept in a binary heap keyed by due time (insertion sequence
//! breaks ties). Consumers block on a `parking_lot::Condvar` until the head
//! record is due: they sleep with a deadline equal to the head's due time and
//! are woken early whenever a record with an earlier deadline is offered.
//! There is no polling.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use super::record::TaskRecord;
use super::task::Task;

/// Heap entry ordered so that the earliest due time pops first.
struct DueEntry<T: ?Sized> {
    due: Instant,
    seq: u64,
    record: Arc<TaskRecord<T>>,
}

impl<T: ?Sized> PartialEq for DueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T: ?Sized> Eq for DueEntry<T> {}

impl<T: ?Sized> PartialOrd for DueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for DueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for the max-heap: earlier due first, then earlier insertion.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState<T: ?Sized> {
    heap: BinaryHeap<DueEntry<T>>,
    next_seq: u64,
}

/// Thread-safe queue handing out records once their due time has elapsed.
pub struct ReadyQueue<T: ?Sized> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T: Task + ?Sized> Default for ReadyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task + ?Sized> ReadyQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Insert `record` at its current due time and wake consumers if it is
    /// now the earliest entry.
    pub fn offer(&self, record: Arc<TaskRecord<T>>) {
        let due = record.due();
        let new_head = {
            let mut state = self.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            let new_head = state.heap.peek().is_none_or(|head| due < head.due);
            state.heap.push(DueEntry { due, seq, record });
            new_head
        };

        if new_head {
            self.available.notify_all();
        }
    }

    /// Block until the earliest record is due, then remove and return it.
    ///
    /// Returns `None` as soon as `active` is cleared and the waiter is woken
    /// through [`ReadyQueue::wake_all`].
    pub fn take_due(&self, active: &AtomicBool) -> Option<Arc<TaskRecord<T>>> {
        let mut state = self.state.lock();
        loop {
            if !active.load(AtomicOrdering::Acquire) {
                return None;
            }

            let next_due = state.heap.peek().map(|head| head.due);
            match next_due {
                None => self.available.wait(&mut state),
                Some(due) if due <= Instant::now() => {
                    return state.heap.pop().map(|entry| entry.record);
                }
                Some(due) => {
                    self.available.wait_until(&mut state, due);
                }
            }
        }
    }

    /// Remove and return the earliest record if it is due at `now`.
    pub fn try_take_due(&self, now: Instant) -> Option<Arc<TaskRecord<T>>> {
        let mut state = self.state.lock();
        if state.heap.peek().is_some_and(|head| head.due <= now) {
            return state.heap.pop().map(|entry| entry.record);
        }
        None
    }

    /// Remove `record` if it is currently queued. Returns whether it was found.
    pub fn purge(&self, record: &Arc<TaskRecord<T>>) -> bool {
        let mut state = self.state.lock();
        let before = state.heap.len();
        state.heap.retain(|entry| !Arc::ptr_eq(&entry.record, record));
        state.heap.len() != before
    }

    /// Wake every blocked consumer so it re-checks its `active` flag.
    pub fn wake_all(&self) {
        // Hold the lock so a consumer between its flag check and its wait
        // cannot miss the notification.
        let _state = self.state.lock();
        self.available.notify_all();
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }
}
