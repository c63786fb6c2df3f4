//! CSV/TSV loading with delimiter detection, and delimited export.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{RefineryError, Result};

use super::table::{Dataset, SourceMetadata};
use super::types::ColumnType;
use super::value::{Row, Value};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Convert cells to typed values based on the inferred column type.
    /// Off by default: cells keep their source text and functions coerce as
    /// they need. Only lossless conversions are made when on.
    pub typed: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            typed: false,
        }
    }
}

/// Loads delimited files into [`Dataset`]s.
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a loader with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a file. The dataset id is the file stem.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| RefineryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| RefineryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());

        let dataset = self.load_bytes(id, &contents, delimiter)?;

        let source = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format_name(delimiter).to_string(),
        );

        tracing::debug!(
            dataset = %dataset.id,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "loaded dataset"
        );

        Ok(dataset.with_source(source))
    }

    /// Load delimited data from any reader, detecting the delimiter unless
    /// one is configured.
    pub fn load_reader(&self, id: impl Into<String>, mut reader: impl Read) -> Result<Dataset> {
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| RefineryError::Io {
            path: PathBuf::from("<reader>"),
            source: e,
        })?;
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };
        self.load_bytes(id, &contents, delimiter)
    }

    /// Load delimited bytes with a known delimiter.
    pub fn load_bytes(&self, id: impl Into<String>, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(RefineryError::EmptyData("No columns found".to_string()));
        }

        let mut rows: Vec<Row> = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let row: Row = headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), Value::from_raw(record.get(i).unwrap_or(""))))
                .collect();
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(RefineryError::EmptyData("No data rows found".to_string()));
        }

        let mut dataset = Dataset::new(id, rows);

        if self.config.typed {
            let types: Vec<(String, ColumnType)> = dataset
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.column_type))
                .collect();
            for row in &mut dataset.rows {
                for (name, column_type) in &types {
                    if let Some(value) = row.get_mut(name) {
                        *value = column_type.coerce(std::mem::take(value));
                    }
                }
            }
        }

        Ok(dataset)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Write rows as delimited text. Columns are written in the given order;
/// missing cells are empty.
pub fn write_delimited<W: Write>(
    writer: W,
    columns: &[String],
    rows: &[Row],
    delimiter: u8,
) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    out.write_record(columns)?;
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|c| row.get(c).map(Value::to_text).unwrap_or_default())
            .collect();
        out.write_record(&record)?;
    }
    out.flush().map_err(|e| RefineryError::Persistence(format!("Failed to flush output: {}", e)))?;

    Ok(())
}

fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(RefineryError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let Some(&first_count) = counts.first() else {
            continue;
        };
        if first_count == 0 {
            continue;
        }

        // Consistent counts across lines win; tab breaks ties
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(b"a,b,c\n1,2,3\n4,5,6").unwrap(), b',');
        assert_eq!(detect_delimiter(b"a\tb\tc\n1\t2\t3").unwrap(), b'\t');
        assert_eq!(detect_delimiter(b"a,\"x,y\"\n1,2").unwrap(), b',');
    }

    #[test]
    fn test_load_keeps_source_text() {
        let data = b"zip,id\n00501,9007199254740993\n10001,42";
        let dataset = Loader::new().load_bytes("places", data, b',').unwrap();

        assert_eq!(dataset.column("zip").unwrap().column_type, ColumnType::Integer);
        assert_eq!(dataset.rows[0]["zip"], Value::text("00501"));
        assert_eq!(dataset.rows[0]["id"], Value::text("9007199254740993"));
    }

    #[test]
    fn test_load_typed_bytes() {
        let loader = Loader::with_config(LoaderConfig {
            typed: true,
            ..LoaderConfig::default()
        });
        let data = b"name,score,joined,zip\nAlice,10,2024-01-15,00501\nBob,,2023-06-01,02134";
        let dataset = loader.load_bytes("people", data, b',').unwrap();

        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column("score").unwrap().column_type, ColumnType::Integer);
        assert_eq!(dataset.rows[0]["score"], Value::number(10.0));
        assert_eq!(dataset.rows[0]["zip"], Value::text("00501"));
        assert_eq!(dataset.rows[1]["score"], Value::Null);
        assert_eq!(dataset.rows[0]["joined"], Value::text("2024-01-15"));
    }

    #[test]
    fn test_load_empty_rows_is_error() {
        let result = Loader::new().load_bytes("d", b"a,b\n", b',');
        assert!(matches!(result, Err(RefineryError::EmptyData(_))));
    }

    #[test]
    fn test_write_delimited() {
        let dataset = Loader::new()
            .load_bytes("d", b"a,b\n1,x\n2.5,", b',')
            .unwrap();
        let columns: Vec<String> = dataset.column_names().iter().map(|s| s.to_string()).collect();

        let mut out = Vec::new();
        write_delimited(&mut out, &columns, &dataset.rows, b',').unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,b\n1,x\n2.5,\n");
    }
}
