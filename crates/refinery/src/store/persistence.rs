//! JSON ledger persistence for the in-memory store.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RefineryError, Result};

use super::memory::MemoryStore;
use super::transformation::Transformation;

/// Current version of the ledger format.
pub const LEDGER_VERSION: &str = "1.0.0";

/// On-disk shape of a transformation ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationLedger {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub transformations: Vec<Transformation>,
}

impl TransformationLedger {
    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            RefineryError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RefineryError::Persistence(format!(
                "Failed to parse transformation ledger '{}': {}",
                path.display(),
                e
            ))
        })
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    RefineryError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        // Write beside the target and rename over it, so readers never see a
        // partly written ledger.
        let staging = staging_path(path);
        let file = File::create(&staging).map_err(|e| {
            RefineryError::Persistence(format!(
                "Failed to create file '{}': {}",
                staging.display(),
                e
            ))
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| {
            RefineryError::Persistence(format!("Failed to serialize transformation ledger: {}", e))
        })?;
        writer.flush().map_err(|e| {
            RefineryError::Persistence(format!("Failed to write '{}': {}", staging.display(), e))
        })?;
        drop(writer);

        fs::rename(&staging, path).map_err(|e| {
            RefineryError::Persistence(format!("Failed to replace '{}': {}", path.display(), e))
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!(".{}.tmp", name))
}

impl MemoryStore {
    /// Write every record to a JSON ledger.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let ledger = TransformationLedger {
            version: LEDGER_VERSION.to_string(),
            updated_at: Utc::now(),
            transformations: self.records(),
        };
        ledger.save(path)?;
        tracing::info!(path = %path.display(), records = ledger.transformations.len(), "saved transformation ledger");
        Ok(())
    }

    /// Load a store from a JSON ledger.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let ledger = TransformationLedger::load(path.as_ref())?;
        Ok(Self::from_records(ledger.transformations))
    }

    /// Load a ledger if it exists, otherwise start empty.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save, first copying the previous ledger into the history directory.
    ///
    /// ```text
    /// data/
    /// ├── people.transforms.json
    /// └── people.transforms.history/
    ///     └── 2024-12-30T10-00-00.json
    /// ```
    pub fn save_with_history(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            let previous = TransformationLedger::load(path)?;
            let stamp = previous.updated_at.format("%Y-%m-%dT%H-%M-%S%.3f");
            previous.save(&history_directory(path).join(format!("{}.json", stamp)))?;
        }
        self.save(path)
    }

    /// Historical ledgers, newest first.
    pub fn list_history(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let history_dir = history_directory(path.as_ref());
        if !history_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&history_dir)
            .map_err(|e| {
                RefineryError::Persistence(format!(
                    "Failed to read history directory '{}': {}",
                    history_dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();

        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }
}

fn history_directory(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}.history", stem))
}

/// Ledger path for a data file.
///
/// ```
/// use refinery::store::transforms_path;
///
/// let path = transforms_path("data/people.csv");
/// assert_eq!(path.to_string_lossy(), "data/people.transforms.json");
/// ```
pub fn transforms_path(data_path: impl AsRef<Path>) -> PathBuf {
    let data_path = data_path.as_ref();
    let stem = data_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = data_path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}.transforms.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TransformationStore;

    #[test]
    fn test_transforms_path() {
        assert_eq!(
            transforms_path("data/people.tsv").to_string_lossy(),
            "data/people.transforms.json"
        );
        assert_eq!(transforms_path("x.csv").to_string_lossy(), "x.transforms.json");
    }

    #[test]
    fn test_history_directory() {
        assert_eq!(
            history_directory(Path::new("data/people.transforms.json")).to_string_lossy(),
            "data/people.transforms.history"
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.transforms.json");

        let store = MemoryStore::new();
        store.insert(Transformation::new("people", "name", "UPPERCASE(name)", 1)).unwrap();
        store.insert(Transformation::new("people", "name", "TRIM(name)", 2)).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.records(), store.records());
    }

    #[test]
    fn test_save_with_history_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.transforms.json");

        let store = MemoryStore::new();
        store.save_with_history(&path).unwrap();
        assert!(MemoryStore::list_history(&path).unwrap().is_empty());

        store.insert(Transformation::new("people", "name", "TRIM(name)", 1)).unwrap();
        store.save_with_history(&path).unwrap();

        let history = MemoryStore::list_history(&path).unwrap();
        assert_eq!(history.len(), 1);
        assert!(MemoryStore::load(&history[0]).unwrap().is_empty());
        assert_eq!(MemoryStore::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MemoryStore::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(RefineryError::Persistence(_))));
        assert!(MemoryStore::load_or_default(dir.path().join("missing.json")).unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_ledger_without_staging_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.transforms.json");
        fs::write(&path, "not json").unwrap();

        let store = MemoryStore::new();
        store.insert(Transformation::new("people", "name", "TRIM(name)", 1)).unwrap();
        store.save(&path).unwrap();

        assert_eq!(MemoryStore::load(&path).unwrap().len(), 1);
        assert!(!staging_path(&path).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
