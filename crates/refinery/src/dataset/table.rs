//! In-memory dataset: column schema plus ordered rows.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::loader::Loader;
use super::types::{ColumnInfo, ColumnType};
use super::value::{Row, Value};

/// Metadata about the file a dataset was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a loaded file.
    pub fn new(path: PathBuf, hash: String, size_bytes: u64, format: String) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            loaded_at: Utc::now(),
        }
    }
}

/// A dataset the engine reads from. The engine never writes back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset identifier (the file stem for loaded files).
    pub id: String,
    /// Column schema, in column order.
    pub columns: Vec<ColumnInfo>,
    /// Row data.
    pub rows: Vec<Row>,
    /// Where the data came from, if loaded from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
}

impl Dataset {
    /// Build a dataset from rows, inferring the column schema.
    ///
    /// Column order follows the first occurrence of each key across rows.
    pub fn new(id: impl Into<String>, rows: Vec<Row>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let column_type =
                    ColumnType::infer(rows.iter().filter_map(|row| row.get(&name)));
                ColumnInfo::new(name, column_type)
            })
            .collect();

        Self {
            id: id.into(),
            columns,
            rows,
            source: None,
        }
    }

    /// Load a CSV/TSV file with default loader settings.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Loader::new().load_file(path)
    }

    /// Load CSV/TSV data from a reader with default loader settings.
    pub fn from_reader(id: impl Into<String>, reader: impl Read) -> Result<Self> {
        Loader::new().load_reader(id, reader)
    }

    /// Attach source metadata.
    pub fn with_source(mut self, source: SourceMetadata) -> Self {
        self.source = Some(source);
        self
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether the dataset has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Get all values for a column. Rows missing the key yield null.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&Value::Null))
    }

    /// First `limit` non-blank values of a column, for previews.
    pub fn sample_values(&self, name: &str, limit: usize) -> Vec<Value> {
        self.column_values(name)
            .filter(|v| !v.is_blank())
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_schema_from_rows() {
        let dataset = Dataset::new(
            "people",
            vec![
                row(&[("name", "Ada".into()), ("age", Value::number(36.0))]),
                row(&[("name", "Alan".into()), ("city", "London".into())]),
            ],
        );

        assert_eq!(dataset.column_names(), vec!["name", "age", "city"]);
        assert_eq!(dataset.column("age").unwrap().column_type, ColumnType::Integer);
        assert_eq!(dataset.column_values("city").collect::<Vec<_>>()[0], &Value::Null);
    }

    #[test]
    fn test_sample_values_skip_blanks() {
        let dataset = Dataset::new(
            "d",
            vec![
                row(&[("c", Value::Null)]),
                row(&[("c", "x".into())]),
                row(&[("c", "  ".into())]),
                row(&[("c", "y".into())]),
            ],
        );

        assert_eq!(dataset.sample_values("c", 5), vec![Value::text("x"), Value::text("y")]);
        assert_eq!(dataset.sample_values("c", 1).len(), 1);
    }

    #[test]
    fn test_from_reader_detects_delimiter() {
        let data = "name\tage\nAda\t36\nAlan\t41\n";
        let dataset = Dataset::from_reader("people", data.as_bytes()).unwrap();
        assert_eq!(dataset.id, "people");
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column("age").unwrap().column_type, ColumnType::Integer);
        assert_eq!(dataset.rows[1]["age"], Value::text("41"));
    }
}
