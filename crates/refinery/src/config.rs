//! Engine configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RefineryError, Result};

/// How `IF` decides whether a cell is truthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfSemantics {
    /// Falsy only when null or blank.
    #[default]
    Existence,
    /// Additionally falsy for `"0"`, `"false"`, `0` and `false`.
    Strict,
}

/// Configuration shared by the function library, pipeline and previewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of before/after pairs a preview returns.
    pub preview_limit: usize,
    /// Row count at which pipeline evaluation is split across threads.
    pub parallel_threshold: usize,
    /// Truthiness rule for `IF`.
    pub if_semantics: IfSemantics,
    /// Date used as "today" by `AGE_IN_YEARS` and `DAYS_BETWEEN`.
    /// Defaults to the current UTC date.
    pub reference_date: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preview_limit: 5,
            parallel_threshold: 10_000,
            if_semantics: IfSemantics::Existence,
            reference_date: None,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RefineryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the preview limit.
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    /// Set the parallel evaluation threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the `IF` truthiness rule.
    pub fn with_if_semantics(mut self, semantics: IfSemantics) -> Self {
        self.if_semantics = semantics;
        self
    }

    /// Pin the reference date.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// The configured reference date, or today's UTC date.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.preview_limit == 0 {
            return Err(RefineryError::Config(
                "preview_limit must be at least 1".to_string(),
            ));
        }
        if self.parallel_threshold == 0 {
            return Err(RefineryError::Config(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
