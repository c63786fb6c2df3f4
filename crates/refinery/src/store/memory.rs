//! The store trait and its in-memory implementation.

use std::sync::RwLock;

use indexmap::IndexMap;

use crate::error::{RefineryError, Result};

use super::transformation::Transformation;

/// Backing storage for transformation records.
///
/// Implementations only need per-call atomicity; the sequencer serializes
/// read-modify-write sequences per column.
pub trait TransformationStore: Send + Sync {
    /// Add a new record.
    fn insert(&self, transformation: Transformation) -> Result<()>;

    /// Fetch a record by id.
    fn get(&self, id: &str) -> Result<Option<Transformation>>;

    /// Replace an existing record. Fails with `NotFound` for unknown ids.
    fn update(&self, transformation: Transformation) -> Result<()>;

    /// Remove a record, returning it if it existed.
    fn remove(&self, id: &str) -> Result<Option<Transformation>>;

    /// All records of a dataset, in insertion order.
    fn list(&self, dataset_id: &str) -> Result<Vec<Transformation>>;
}

/// Transformation records held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<IndexMap<String, Transformation>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given records.
    pub fn from_records(records: impl IntoIterator<Item = Transformation>) -> Self {
        let records = records.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Vec<Transformation> {
        self.read().values().cloned().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<String, Transformation>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<String, Transformation>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TransformationStore for MemoryStore {
    fn insert(&self, transformation: Transformation) -> Result<()> {
        self.write().insert(transformation.id.clone(), transformation);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Transformation>> {
        Ok(self.read().get(id).cloned())
    }

    fn update(&self, transformation: Transformation) -> Result<()> {
        let mut records = self.write();
        match records.get_mut(&transformation.id) {
            Some(slot) => {
                *slot = transformation;
                Ok(())
            }
            None => Err(RefineryError::NotFound(format!(
                "transformation '{}'",
                transformation.id
            ))),
        }
    }

    fn remove(&self, id: &str) -> Result<Option<Transformation>> {
        Ok(self.write().shift_remove(id))
    }

    fn list(&self, dataset_id: &str) -> Result<Vec<Transformation>> {
        Ok(self
            .read()
            .values()
            .filter(|t| t.dataset_id == dataset_id)
            .cloned()
            .collect())
    }
}
