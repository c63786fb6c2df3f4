//! CLI command implementations.

pub mod add;
pub mod apply;
pub mod cleanup;
pub mod functions;
pub mod list;
pub mod preview;
pub mod remove;
pub mod reorder;
pub mod serve;

use std::path::{Path, PathBuf};

use colored::Colorize;
use refinery::store::transforms_path;
use refinery::{
    Dataset, EngineConfig, MemoryStore, Sequencer, Transformation, TransformationStatus,
};

/// Load the engine configuration, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(EngineConfig::from_path(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// A data file together with its transformation ledger.
pub struct Project {
    pub dataset: Dataset,
    pub ledger_path: PathBuf,
    pub sequencer: Sequencer,
}

impl Project {
    /// Load the data file and the ledger next to it (if any).
    pub fn open(file: &Path, config: EngineConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if !file.exists() {
            return Err(format!("Data file not found: {}", file.display()).into());
        }

        let dataset = Dataset::from_path(file)?;
        let ledger_path = transforms_path(file);
        let store = MemoryStore::load_or_default(&ledger_path)?;
        tracing::debug!(ledger = %ledger_path.display(), records = store.len(), "opened project");

        Ok(Self {
            dataset,
            ledger_path,
            sequencer: Sequencer::new(store, config),
        })
    }

    /// Fail unless the dataset has `column`.
    pub fn require_column(&self, column: &str) -> Result<(), Box<dyn std::error::Error>> {
        if self.dataset.has_column(column) {
            return Ok(());
        }
        Err(format!(
            "Column '{}' not found. Available columns: {}",
            column,
            self.dataset.column_names().join(", ")
        )
        .into())
    }

    /// Persist the ledger, keeping the previous version in history.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.sequencer.store().save_with_history(&self.ledger_path)?;
        Ok(())
    }
}

/// One-line colored summary of a transformation.
pub fn describe(t: &Transformation) -> String {
    let label = t.status.label();
    let status = match t.status {
        TransformationStatus::Active => label.green(),
        TransformationStatus::Applied => label.blue(),
        TransformationStatus::Draft => label.yellow(),
        TransformationStatus::Deleted => label.red(),
    };
    format!(
        "{:>3}. {} {} [{}] {}",
        t.sequence_number,
        t.expression.white().bold(),
        format!("({})", t.function_type).dimmed(),
        status,
        t.id.dimmed()
    )
}
