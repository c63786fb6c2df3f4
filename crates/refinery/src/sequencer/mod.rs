//! Per-column chains of transformations.
//!
//! The sequencer owns the lifecycle rules: one live transformation per
//! function name on a column, contiguous sequence numbers after a reorder,
//! and soft or hard deletion. Evaluation is delegated to [`Pipeline`].

mod locks;

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::EngineConfig;
use crate::dataset::{Dataset, Row};
use crate::error::{RefineryError, Result};
use crate::functions::FunctionLibrary;
use crate::pipeline::Pipeline;
use crate::store::{
    DeleteMode, MemoryStore, NewTransformation, Transformation, TransformationStatus,
    TransformationStore, TransformationUpdate,
};

use locks::ColumnLocks;

/// Orders, validates and applies transformations held in a store.
pub struct Sequencer<S: TransformationStore = MemoryStore> {
    store: S,
    library: FunctionLibrary,
    locks: ColumnLocks,
}

impl Sequencer<MemoryStore> {
    /// A sequencer over an empty in-memory store.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(MemoryStore::new(), config)
    }
}

impl<S: TransformationStore> Sequencer<S> {
    /// Create a sequencer over `store`.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            library: FunctionLibrary::new(config),
            locks: ColumnLocks::default(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The function library used for evaluation.
    pub fn library(&self) -> &FunctionLibrary {
        &self.library
    }

    /// Add a transformation to the end of its column's chain.
    ///
    /// Fails with [`RefineryError::DuplicateFunctionOnColumn`] when a live
    /// transformation on the same column already uses the function.
    pub fn create(&self, request: NewTransformation) -> Result<Transformation> {
        let status = request.status.unwrap_or_default();
        if status == TransformationStatus::Deleted {
            return Err(RefineryError::InvalidUpdate(
                "a transformation cannot be created as deleted".to_string(),
            ));
        }

        let lock = self.locks.get(&request.dataset_id, &request.column);
        let _guard = ColumnLocks::acquire(&lock);

        let live = self.live(&request.dataset_id, &request.column)?;
        let transformation = Transformation::new(
            request.dataset_id,
            request.column,
            request.expression,
            next_sequence(&live),
        )
        .with_status(status)
        .with_output(request.output.unwrap_or_default());

        if transformation.is_live() {
            ensure_unique(&transformation, &live)?;
        }

        self.store.insert(transformation.clone())?;
        tracing::info!(
            id = %transformation.id,
            dataset = %transformation.dataset_id,
            column = %transformation.target_column,
            expression = %transformation.expression,
            sequence = transformation.sequence_number,
            "created transformation"
        );
        Ok(transformation)
    }

    /// Renumber a column's live chain to `1..=N` in the given order.
    ///
    /// `ordered_ids` must name every live transformation of the column
    /// exactly once.
    pub fn reorder(
        &self,
        dataset_id: &str,
        column: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<Transformation>> {
        let lock = self.locks.get(dataset_id, column);
        let _guard = ColumnLocks::acquire(&lock);

        let live = self.live(dataset_id, column)?;
        let incomplete = || RefineryError::IncompleteReorderSet {
            column: column.to_string(),
            expected: live.len(),
            received: ordered_ids.len(),
        };

        let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        let existing: HashSet<&str> = live.iter().map(|t| t.id.as_str()).collect();
        if requested.len() != ordered_ids.len() || requested != existing {
            return Err(incomplete());
        }

        let mut by_id: HashMap<&str, &Transformation> =
            live.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut reordered = Vec::with_capacity(live.len());
        for (position, id) in ordered_ids.iter().enumerate() {
            let mut t = by_id.remove(id.as_str()).ok_or_else(incomplete)?.clone();
            let sequence = sequence_at(position)?;
            if t.sequence_number != sequence {
                t.sequence_number = sequence;
                t.touch();
                self.store.update(t.clone())?;
            }
            reordered.push(t);
        }

        tracing::info!(dataset = dataset_id, column, count = reordered.len(), "reordered chain");
        Ok(reordered)
    }

    /// Change the sequence number and/or status of a transformation.
    pub fn update(&self, id: &str, update: TransformationUpdate) -> Result<Transformation> {
        let current = self.require(id)?;
        let lock = self.locks.get(&current.dataset_id, &current.target_column);
        let _guard = ColumnLocks::acquire(&lock);

        let mut t = self.require(id)?;
        if update.is_empty() {
            return Ok(t);
        }
        if update.sequence_number == Some(0) {
            return Err(RefineryError::InvalidUpdate(
                "sequence numbers start at 1".to_string(),
            ));
        }

        let live: Vec<Transformation> = self
            .live(&t.dataset_id, &t.target_column)?
            .into_iter()
            .filter(|other| other.id != t.id)
            .collect();

        if let Some(status) = update.status {
            if status.is_live() && !t.is_live() {
                ensure_unique(&t, &live)?;
                if update.sequence_number.is_none() {
                    t.sequence_number = next_sequence(&live);
                }
            }
            t.status = status;
        }
        if let Some(sequence) = update.sequence_number {
            if t.is_live() && live.iter().any(|other| other.sequence_number == sequence) {
                return Err(RefineryError::InvalidUpdate(format!(
                    "sequence number {} is already used in the chain for column '{}'",
                    sequence, t.target_column
                )));
            }
            t.sequence_number = sequence;
        }

        t.touch();
        self.store.update(t.clone())?;
        tracing::info!(id, status = t.status.label(), sequence = t.sequence_number, "updated transformation");
        Ok(t)
    }

    /// Delete a transformation. Remaining sequence numbers are not changed.
    pub fn delete(&self, id: &str, mode: DeleteMode) -> Result<Transformation> {
        let current = self.require(id)?;
        let lock = self.locks.get(&current.dataset_id, &current.target_column);
        let _guard = ColumnLocks::acquire(&lock);

        let result = match mode {
            DeleteMode::Soft => {
                let mut t = self.require(id)?;
                t.status = TransformationStatus::Deleted;
                t.touch();
                self.store.update(t.clone())?;
                t
            }
            DeleteMode::Hard => self
                .store
                .remove(id)?
                .ok_or_else(|| not_found(id))?,
        };

        tracing::info!(id, mode = ?mode, "deleted transformation");
        Ok(result)
    }

    /// Remove duplicate live transformations across a dataset.
    ///
    /// For each column and function name, the live transformation with the
    /// lowest sequence number is kept and the others are hard-deleted.
    /// Returns the number removed.
    pub fn cleanup(&self, dataset_id: &str) -> Result<usize> {
        let columns: BTreeSet<String> = self
            .store
            .list(dataset_id)?
            .into_iter()
            .filter(Transformation::is_live)
            .map(|t| t.target_column)
            .collect();

        let locks: Vec<_> = columns.iter().map(|c| self.locks.get(dataset_id, c)).collect();
        let _guards: Vec<_> = locks.iter().map(ColumnLocks::acquire).collect();

        let mut live: Vec<Transformation> = self
            .store
            .list(dataset_id)?
            .into_iter()
            .filter(Transformation::is_live)
            .collect();
        live.sort_by(chain_order);

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut removed = 0;
        for t in live {
            let Some(function) = t.function_name() else {
                continue;
            };
            if !seen.insert((t.target_column.clone(), function)) {
                self.store.remove(&t.id)?;
                removed += 1;
            }
        }

        tracing::info!(dataset = dataset_id, removed, "cleaned up duplicate transformations");
        Ok(removed)
    }

    /// Every transformation of a dataset, grouped by column in chain order.
    pub fn list(&self, dataset_id: &str) -> Result<Vec<Transformation>> {
        let mut all = self.store.list(dataset_id)?;
        all.sort_by(|a, b| {
            a.target_column
                .cmp(&b.target_column)
                .then_with(|| chain_order(a, b))
        });
        Ok(all)
    }

    /// Live transformations of a column, in application order.
    pub fn chain(&self, dataset_id: &str, column: &str) -> Result<Vec<Transformation>> {
        self.live(dataset_id, column)
    }

    /// The committed chain of a column as a pipeline.
    pub fn pipeline(&self, dataset_id: &str, column: &str) -> Result<Pipeline> {
        Ok(Pipeline::from_transformations(
            column,
            &self.store.list(dataset_id)?,
        ))
    }

    /// Derived rows for one column's chain. `rows` is left untouched.
    pub fn apply(&self, dataset_id: &str, column: &str, rows: &[Row]) -> Result<Vec<Row>> {
        let pipeline = self.pipeline(dataset_id, column)?;
        tracing::debug!(dataset = dataset_id, column, steps = pipeline.len(), rows = rows.len(), "applying chain");
        Ok(pipeline.apply(&self.library, rows))
    }

    /// Derived rows for every column of a dataset that has a chain.
    ///
    /// Columns are processed in schema order, so a chain that reads another
    /// column sees that column's derived value if it comes earlier.
    pub fn apply_dataset(&self, dataset: &Dataset) -> Result<Vec<Row>> {
        let records = self.store.list(&dataset.id)?;
        let mut rows = dataset.rows.clone();
        for column in dataset.column_names() {
            let pipeline = Pipeline::from_transformations(column, &records);
            if !pipeline.is_empty() {
                rows = pipeline.apply(&self.library, &rows);
            }
        }
        Ok(rows)
    }

    fn require(&self, id: &str) -> Result<Transformation> {
        self.store.get(id)?.ok_or_else(|| not_found(id))
    }

    fn live(&self, dataset_id: &str, column: &str) -> Result<Vec<Transformation>> {
        let mut live: Vec<Transformation> = self
            .store
            .list(dataset_id)?
            .into_iter()
            .filter(|t| t.is_live() && t.target_column == column)
            .collect();
        live.sort_by(chain_order);
        Ok(live)
    }
}

fn not_found(id: &str) -> RefineryError {
    RefineryError::NotFound(format!("transformation '{}'", id))
}

fn chain_order(a: &Transformation, b: &Transformation) -> std::cmp::Ordering {
    a.sequence_number
        .cmp(&b.sequence_number)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn next_sequence(live: &[Transformation]) -> u32 {
    live.iter().map(|t| t.sequence_number).max().unwrap_or(0) + 1
}

fn sequence_at(position: usize) -> Result<u32> {
    u32::try_from(position + 1)
        .map_err(|_| RefineryError::InvalidUpdate("chain is too long to renumber".to_string()))
}

fn ensure_unique(candidate: &Transformation, live: &[Transformation]) -> Result<()> {
    let Some(function) = candidate.function_name() else {
        return Ok(());
    };
    let clash = live
        .iter()
        .any(|t| t.id != candidate.id && t.function_name().as_deref() == Some(function.as_str()));
    if clash {
        return Err(RefineryError::DuplicateFunctionOnColumn {
            column: candidate.target_column.clone(),
            function,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn sequencer() -> Sequencer {
        Sequencer::in_memory(EngineConfig::default())
    }

    fn add(seq: &Sequencer, column: &str, expression: &str) -> Transformation {
        seq.create(NewTransformation::new("people", column, expression)).unwrap()
    }

    #[test]
    fn test_create_assigns_next_sequence() {
        let seq = sequencer();
        assert_eq!(add(&seq, "name", "TRIM(name)").sequence_number, 1);
        assert_eq!(add(&seq, "name", "UPPERCASE(name)").sequence_number, 2);
        assert_eq!(add(&seq, "age", "ABS(age)").sequence_number, 1);
    }

    #[test]
    fn test_create_rejects_duplicate_function() {
        let seq = sequencer();
        add(&seq, "name", "UPPERCASE(name)");
        let err = seq
            .create(NewTransformation::new("people", "name", "uppercase(name)"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function 'UPPERCASE' is already applied to column 'name'"
        );
    }

    #[test]
    fn test_draft_does_not_count_as_live() {
        let seq = sequencer();
        let draft = seq
            .create(
                NewTransformation::new("people", "name", "UPPERCASE(name)")
                    .with_status(TransformationStatus::Draft),
            )
            .unwrap();
        add(&seq, "name", "UPPERCASE(name)");
        let err = seq
            .update(&draft.id, TransformationUpdate::new().with_status(TransformationStatus::Active))
            .unwrap_err();
        assert!(matches!(err, RefineryError::DuplicateFunctionOnColumn { .. }));
    }

    #[test]
    fn test_update_rejects_zero_sequence() {
        let seq = sequencer();
        let t = add(&seq, "name", "TRIM(name)");
        let err = seq.update(&t.id, TransformationUpdate::new().with_sequence(0)).unwrap_err();
        assert!(matches!(err, RefineryError::InvalidUpdate(_)));
    }

    #[test]
    fn test_delete_soft_and_hard() {
        let seq = sequencer();
        let a = add(&seq, "name", "TRIM(name)");
        let b = add(&seq, "name", "UPPERCASE(name)");

        let soft = seq.delete(&a.id, DeleteMode::Soft).unwrap();
        assert_eq!(soft.status, TransformationStatus::Deleted);
        assert_eq!(seq.list("people").unwrap().len(), 2);

        seq.delete(&b.id, DeleteMode::Hard).unwrap();
        assert_eq!(seq.list("people").unwrap().len(), 1);
        assert!(matches!(seq.delete(&b.id, DeleteMode::Hard), Err(RefineryError::NotFound(_))));
    }

    #[test]
    fn test_apply_uses_chain() {
        let seq = sequencer();
        add(&seq, "name", "TRIM(name)");
        add(&seq, "name", "UPPERCASE(name)");
        let rows = vec![Row::from([("name".to_string(), Value::text(" ada "))])];
        let out = seq.apply("people", "name", &rows).unwrap();
        assert_eq!(out[0]["name"], Value::text("ADA"));
        assert_eq!(rows[0]["name"], Value::text(" ada "));
    }
}
