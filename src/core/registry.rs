//! Id -> record mapping used for lookup and cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::record::TaskRecord;
use super::task::{Task, TaskId};

/// Concurrent map of registered tasks.
///
/// Reads come from any thread (`Scheduler::get`); writes are funneled
/// through the sequencer thread.
pub struct Registry<T: ?Sized> {
    records: RwLock<HashMap<TaskId, Arc<TaskRecord<T>>>>,
}

impl<T: Task + ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task + ?Sized> Registry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert `record` under its task id unless the id is already taken.
    /// Returns `false` and leaves the existing record untouched otherwise.
    pub fn insert(&self, record: Arc<TaskRecord<T>>) -> bool {
        let mut records = self.records.write();
        if records.contains_key(record.id()) {
            return false;
        }
        records.insert(record.id().to_string(), record);
        true
    }

    /// Remove and return the record for `id`.
    pub fn remove(&self, id: &str) -> Option<Arc<TaskRecord<T>>> {
        self.records.write().remove(id)
    }

    /// Record registered under `id`.
    pub fn get(&self, id: &str) -> Option<Arc<TaskRecord<T>>> {
        self.records.read().get(id).cloned()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.records.read().contains_key(id)
    }

    /// Ids of all registered tasks, in no particular order.
    pub fn ids(&self) -> Vec<TaskId> {
        self.records.read().keys().cloned().collect()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no task is registered.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
