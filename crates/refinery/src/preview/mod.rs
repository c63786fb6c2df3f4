//! Before/after previews of a candidate transformation.
//!
//! Previews run through the same [`Pipeline`] as committed chains, so what a
//! preview shows is what applying the transformation produces.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::dataset::{Row, Value};
use crate::expression::leading_function_name;
use crate::functions::FunctionLibrary;
use crate::pipeline::{Pipeline, Step};
use crate::store::OutputMode;

/// Values shown when there is nothing to sample.
pub const PLACEHOLDER_SAMPLES: [&str; 3] = ["Sample Text", "12345", "2024-01-15"];

/// A candidate transformation and the data to preview it on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub column: String,
    pub expression: String,
    /// Values of the target column.
    #[serde(default)]
    pub samples: Vec<Value>,
    /// Full rows, for expressions that read other columns. Takes precedence
    /// over `samples`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<Row>,
    #[serde(default)]
    pub output: OutputMode,
}

impl PreviewRequest {
    pub fn new(column: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            expression: expression.into(),
            ..Self::default()
        }
    }

    /// Preview on these column values.
    pub fn with_samples(mut self, samples: Vec<Value>) -> Self {
        self.samples = samples;
        self
    }

    /// Preview on these rows.
    pub fn with_context(mut self, rows: Vec<Row>) -> Self {
        self.context = rows;
        self
    }

    /// Preview writing into a new column.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// One before/after pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewPair {
    pub before: Value,
    pub after: Value,
}

impl PreviewPair {
    /// Whether the transformation changed the value.
    pub fn is_changed(&self) -> bool {
        self.before != self.after
    }
}

/// Result of a preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub pairs: Vec<PreviewPair>,
    /// Number of pairs whose value changed.
    pub changed: usize,
    /// Leading function name, if any.
    pub function: Option<String>,
    /// False when re-running the preview may give different output.
    pub deterministic: bool,
}

/// Generates previews.
#[derive(Debug, Clone, Default)]
pub struct Previewer {
    library: FunctionLibrary,
}

impl Previewer {
    /// Create a previewer with its own library.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_library(FunctionLibrary::new(config))
    }

    /// Create a previewer sharing a library configuration.
    pub fn with_library(library: FunctionLibrary) -> Self {
        Self { library }
    }

    /// Preview the candidate on its own.
    pub fn preview(&self, request: &PreviewRequest) -> Preview {
        let rows = self.sample_rows(request);
        self.diff(request, &rows)
    }

    /// Preview the candidate on top of a committed chain: samples are run
    /// through `chain` first and the pairs show what the candidate does to
    /// that output.
    pub fn preview_on_chain(&self, chain: &Pipeline, request: &PreviewRequest) -> Preview {
        let rows = chain.apply(&self.library, &self.sample_rows(request));
        self.diff(request, &rows)
    }

    /// Every input row. The chain and the candidate run over all of them so
    /// column statistics match a committed apply; only the pairs are capped.
    fn sample_rows(&self, request: &PreviewRequest) -> Vec<Row> {
        if !request.context.is_empty() {
            return request.context.clone();
        }

        let single = |value: Value| Row::from([(request.column.clone(), value)]);
        if request.samples.is_empty() {
            PLACEHOLDER_SAMPLES
                .iter()
                .map(|s| single(Value::text(*s)))
                .collect()
        } else {
            request.samples.iter().cloned().map(single).collect()
        }
    }

    fn diff(&self, request: &PreviewRequest, rows: &[Row]) -> Preview {
        let limit = self.library.config().preview_limit;
        let step = Step::parse(&request.expression).with_output(request.output.clone());
        let after_rows = Pipeline::new(&request.column, vec![step]).apply(&self.library, rows);

        let target = match &request.output {
            OutputMode::Overwrite => request.column.as_str(),
            OutputMode::NewColumn { name } => name.as_str(),
        };
        let all: Vec<PreviewPair> = rows
            .iter()
            .zip(&after_rows)
            .map(|(before, after)| PreviewPair {
                before: before.get(&request.column).cloned().unwrap_or_default(),
                after: after.get(target).cloned().unwrap_or_default(),
            })
            .collect();

        // Prefer rows that have a value to show; fall back to the first rows.
        let mut pairs: Vec<PreviewPair> = all
            .iter()
            .filter(|p| !p.before.is_blank())
            .take(limit)
            .cloned()
            .collect();
        if pairs.is_empty() {
            pairs = all.into_iter().take(limit).collect();
        }

        let function = leading_function_name(&request.expression);
        let deterministic = function
            .as_deref()
            .is_none_or(|name| self.library.is_deterministic(name));

        Preview {
            changed: pairs.iter().filter(|p| p.is_changed()).count(),
            pairs,
            function,
            deterministic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_when_no_samples() {
        let preview = Previewer::default().preview(&PreviewRequest::new("x", "UPPERCASE(x)"));
        let before: Vec<String> = preview.pairs.iter().map(|p| p.before.to_text()).collect();
        assert_eq!(before, vec!["Sample Text", "12345", "2024-01-15"]);
        assert_eq!(preview.pairs[0].after, Value::text("SAMPLE TEXT"));
        assert_eq!(preview.changed, 1);
        assert!(preview.deterministic);
    }

    #[test]
    fn test_limit_caps_pairs() {
        let samples: Vec<Value> = (0..20).map(|i| Value::number(f64::from(i))).collect();
        let previewer = Previewer::new(EngineConfig::new().with_preview_limit(3));
        let preview = previewer.preview(&PreviewRequest::new("n", "ADD(n, 1)").with_samples(samples));
        assert_eq!(preview.pairs.len(), 3);
        assert_eq!(preview.pairs[2].after, Value::number(3.0));
        assert_eq!(preview.changed, 3);
    }

    #[test]
    fn test_non_deterministic_flag() {
        let preview = Previewer::default().preview(&PreviewRequest::new("id", "GENERATE_ID(id, \"u\")"));
        assert!(!preview.deterministic);
        assert_eq!(preview.function.as_deref(), Some("GENERATE_ID"));
    }

    #[test]
    fn test_opaque_expression_changes_nothing() {
        let request = PreviewRequest::new("x", "UPPERCASE(").with_samples(vec![Value::text("a")]);
        let preview = Previewer::default().preview(&request);
        assert_eq!(preview.changed, 0);
        assert_eq!(preview.pairs[0].after, Value::text("a"));
    }

    #[test]
    fn test_preview_on_chain() {
        let chain = Pipeline::new("x", vec![Step::parse("TRIM(x)")]);
        let request = PreviewRequest::new("x", "UPPERCASE(x)").with_samples(vec![Value::text("  ab ")]);
        let preview = Previewer::default().preview_on_chain(&chain, &request);
        assert_eq!(preview.pairs[0].before, Value::text("ab"));
        assert_eq!(preview.pairs[0].after, Value::text("AB"));
    }

    #[test]
    fn test_new_column_preview() {
        let row = Row::from([
            ("first".to_string(), Value::text("Ada")),
            ("last".to_string(), Value::text("Lovelace")),
        ]);
        let request = PreviewRequest::new("first", r#"CONCAT(first, " ", last)"#)
            .with_context(vec![row])
            .with_output(OutputMode::NewColumn { name: "full".to_string() });
        let preview = Previewer::default().preview(&request);
        assert_eq!(preview.pairs[0].before, Value::text("Ada"));
        assert_eq!(preview.pairs[0].after, Value::text("Ada Lovelace"));
    }

    #[test]
    fn test_statistics_use_every_row() {
        let samples: Vec<Value> = [0.0, 10.0, 20.0, 30.0, 100.0].map(Value::number).to_vec();
        let previewer = Previewer::new(EngineConfig::new().with_preview_limit(3));
        let preview = previewer.preview(&PreviewRequest::new("v", "NORMALIZE(v)").with_samples(samples));
        let after: Vec<Value> = preview.pairs.iter().map(|p| p.after.clone()).collect();
        assert_eq!(after, [0.0, 0.1, 0.2].map(Value::number).to_vec());
    }

    #[test]
    fn test_blank_rows_skipped_in_pairs() {
        let samples = vec![Value::Null, Value::text("a"), Value::text("")];
        let preview = Previewer::default().preview(&PreviewRequest::new("x", "UPPERCASE(x)").with_samples(samples));
        assert_eq!(preview.pairs.len(), 1);
        assert_eq!(preview.pairs[0].after, Value::text("A"));
    }
}
