//! Transformation records and their lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expression::leading_function_name;
use crate::functions::FunctionType;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a transformation id: `tf_` followed by 12 random characters.
pub fn new_transformation_id() -> String {
    let suffix: String = (0..12)
        .map(|_| char::from(ID_ALPHABET[fastrand::usize(..ID_ALPHABET.len())]))
        .collect();
    format!("tf_{}", suffix)
}

/// Lifecycle state of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationStatus {
    /// Saved but not part of the chain.
    Draft,
    /// Part of the chain.
    #[default]
    Active,
    /// Part of the chain and materialized downstream.
    Applied,
    /// Soft-deleted.
    Deleted,
}

impl TransformationStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TransformationStatus::Draft => "draft",
            TransformationStatus::Active => "active",
            TransformationStatus::Applied => "applied",
            TransformationStatus::Deleted => "deleted",
        }
    }

    /// Whether a transformation in this state takes part in the chain.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            TransformationStatus::Active | TransformationStatus::Applied
        )
    }
}

impl std::str::FromStr for TransformationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(TransformationStatus::Draft),
            "active" => Ok(TransformationStatus::Active),
            "applied" => Ok(TransformationStatus::Applied),
            "deleted" => Ok(TransformationStatus::Deleted),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Where a step writes its result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum OutputMode {
    /// Replace the chain value of the target column.
    #[default]
    Overwrite,
    /// Write into a separate column; the chain value is left unchanged.
    NewColumn { name: String },
}

/// A named, ordered transformation attached to one column of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    pub id: String,
    pub dataset_id: String,
    pub target_column: String,
    /// Expression text, e.g. `LEFT(name, 3)`.
    pub expression: String,
    pub function_type: FunctionType,
    pub status: TransformationStatus,
    /// Position in the column's chain, starting at 1.
    pub sequence_number: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub output: OutputMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transformation {
    /// Create an active transformation with a fresh id.
    pub fn new(
        dataset_id: impl Into<String>,
        target_column: impl Into<String>,
        expression: impl Into<String>,
        sequence_number: u32,
    ) -> Self {
        let expression = expression.into();
        Self {
            id: new_transformation_id(),
            dataset_id: dataset_id.into(),
            target_column: target_column.into(),
            function_type: FunctionType::of_expression(&expression),
            expression,
            status: TransformationStatus::Active,
            sequence_number,
            created_at: Utc::now(),
            output: OutputMode::Overwrite,
            updated_at: None,
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: TransformationStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the output mode.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Upper-cased leading function name of the expression.
    pub fn function_name(&self) -> Option<String> {
        leading_function_name(&self.expression)
    }

    /// Whether this transformation takes part in the chain.
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Record a modification time.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Request to create a transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransformation {
    pub dataset_id: String,
    pub column: String,
    pub expression: String,
    /// Defaults to active.
    #[serde(default)]
    pub status: Option<TransformationStatus>,
    #[serde(default)]
    pub output: Option<OutputMode>,
}

impl NewTransformation {
    pub fn new(
        dataset_id: impl Into<String>,
        column: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            column: column.into(),
            expression: expression.into(),
            status: None,
            output: None,
        }
    }

    /// Request a specific initial status.
    pub fn with_status(mut self, status: TransformationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Write the result into a new column.
    pub fn into_column(mut self, name: impl Into<String>) -> Self {
        self.output = Some(OutputMode::NewColumn { name: name.into() });
        self
    }
}

/// Partial update of a transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationUpdate {
    #[serde(default)]
    pub sequence_number: Option<u32>,
    #[serde(default)]
    pub status: Option<TransformationStatus>,
}

impl TransformationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, sequence_number: u32) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn with_status(mut self, status: TransformationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.sequence_number.is_none() && self.status.is_none()
    }
}

/// How a transformation is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Mark as deleted and keep the record.
    #[default]
    Soft,
    /// Remove the record.
    Hard,
}
