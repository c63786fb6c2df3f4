//! Per-column mutual exclusion for read-modify-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type ColumnKey = (String, String);

/// Lazily created lock per `(dataset, column)`.
#[derive(Debug, Default)]
pub(crate) struct ColumnLocks {
    locks: Mutex<HashMap<ColumnKey, Arc<Mutex<()>>>>,
}

impl ColumnLocks {
    /// The lock for a column, created on first use.
    pub(crate) fn get(&self, dataset_id: &str, column: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry((dataset_id.to_string(), column.to_string()))
            .or_default()
            .clone()
    }

    /// Hold a column lock. A poisoned lock is still usable since it guards
    /// no data of its own.
    pub(crate) fn acquire(lock: &Arc<Mutex<()>>) -> MutexGuard<'_, ()> {
        lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}
