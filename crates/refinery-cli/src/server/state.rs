//! Application state for the web server.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use refinery::store::transforms_path;
use refinery::{Dataset, EngineConfig, MemoryStore, RefineryError, Sequencer, TransformationStore};

use super::error::ApiError;

/// A served dataset with its own chain store.
pub struct Workspace {
    pub dataset: Dataset,
    pub sequencer: Sequencer,
    /// Where the ledger is written after each change. None keeps it in memory.
    pub ledger_path: Option<PathBuf>,
    save_lock: Mutex<()>,
}

impl Workspace {
    /// Workspace backed by an in-memory store only.
    #[cfg(test)]
    pub fn in_memory(dataset: Dataset, config: EngineConfig) -> Self {
        Self {
            dataset,
            sequencer: Sequencer::in_memory(config),
            ledger_path: None,
            save_lock: Mutex::new(()),
        }
    }

    /// Load a data file and the ledger next to it.
    pub fn open(file: &Path, config: EngineConfig) -> refinery::Result<Self> {
        let dataset = Dataset::from_path(file)?;
        let ledger_path = transforms_path(file);
        let store = MemoryStore::load_or_default(&ledger_path)?;
        Ok(Self {
            dataset,
            sequencer: Sequencer::new(store, config),
            ledger_path: Some(ledger_path),
            save_lock: Mutex::new(()),
        })
    }

    /// Persist the ledger if this workspace has one.
    ///
    /// Saves of one workspace run one at a time.
    pub fn save(&self) -> refinery::Result<()> {
        if let Some(path) = &self.ledger_path {
            let _guard = self.save_lock.lock().unwrap_or_else(|e| e.into_inner());
            self.sequencer.store().save_with_history(path)?;
        }
        Ok(())
    }
}

/// Shared application state.
///
/// The set of datasets is fixed at startup; each sequencer serializes its
/// own mutations per column.
#[derive(Clone)]
pub struct AppState {
    pub datasets: Arc<BTreeMap<String, Workspace>>,
}

impl AppState {
    /// Create state from already-built workspaces, keyed by dataset id.
    ///
    /// Two workspaces with the same dataset id are rejected.
    pub fn new(workspaces: impl IntoIterator<Item = Workspace>) -> refinery::Result<Self> {
        let mut datasets = BTreeMap::new();
        for workspace in workspaces {
            let id = workspace.dataset.id.clone();
            if datasets.contains_key(&id) {
                return Err(RefineryError::Config(format!(
                    "more than one data file maps to dataset id '{}'",
                    id
                )));
            }
            datasets.insert(id, workspace);
        }
        Ok(Self {
            datasets: Arc::new(datasets),
        })
    }

    /// Load every data file with its ledger.
    pub fn open(files: &[PathBuf], config: EngineConfig) -> refinery::Result<Self> {
        let workspaces = files
            .iter()
            .map(|f| Workspace::open(f, config.clone()))
            .collect::<refinery::Result<Vec<_>>>()?;
        Self::new(workspaces)
    }

    /// The workspace for a dataset id.
    pub fn workspace(&self, dataset_id: &str) -> Result<&Workspace, ApiError> {
        self.datasets
            .get(dataset_id)
            .ok_or_else(|| ApiError::NotFound(format!("Dataset not found: {}", dataset_id)))
    }

    /// The workspace holding a transformation id.
    pub fn owner_of(&self, transformation_id: &str) -> Result<&Workspace, ApiError> {
        for workspace in self.datasets.values() {
            if workspace.sequencer.store().get(transformation_id)?.is_some() {
                return Ok(workspace);
            }
        }
        Err(ApiError::NotFound(format!(
            "Transformation not found: {}",
            transformation_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;

    use refinery::Transformation;

    // =========================================================================
    // Dataset ids
    // =========================================================================

    #[test]
    fn test_open_rejects_colliding_file_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        let first = dir.path().join("a/people.csv");
        let second = dir.path().join("b/people.csv");
        fs::write(&first, "name\nada\n").unwrap();
        fs::write(&second, "name\nalan\n").unwrap();

        let result = AppState::open(&[first.clone(), second], EngineConfig::default());
        assert!(matches!(result, Err(RefineryError::Config(_))));

        let state = AppState::open(&[first], EngineConfig::default()).unwrap();
        assert!(state.workspace("people").is_ok());
    }

    // =========================================================================
    // Saving
    // =========================================================================

    #[test]
    fn test_concurrent_saves_leave_a_readable_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("people.csv");
        fs::write(&file, "name\nada\n").unwrap();

        let workspace = Workspace::open(&file, EngineConfig::default()).unwrap();
        thread::scope(|scope| {
            for i in 0..8 {
                let workspace = &workspace;
                scope.spawn(move || {
                    let record = Transformation::new("people", "name", "TRIM(name)", i + 1);
                    workspace.sequencer.store().insert(record).unwrap();
                    workspace.save().unwrap();
                });
            }
        });

        let ledger = workspace.ledger_path.clone().unwrap();
        let loaded = MemoryStore::load(&ledger).unwrap();
        assert_eq!(loaded.len(), 8);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
