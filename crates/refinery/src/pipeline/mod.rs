//! The column pipeline: threads a column's value through an ordered chain of
//! steps.
//!
//! This is the only place expressions are evaluated against rows. Both the
//! sequencer and the previewer go through [`Pipeline::apply`].

mod parallel;

use serde::{Deserialize, Serialize};

use crate::dataset::{Row, Value};
use crate::expression::{self, Argument, Expression, ParsedExpression};
use crate::functions::{EvalContext, FunctionLibrary};
use crate::store::{OutputMode, Transformation};

pub use parallel::map_slice;

/// One parsed step of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub expression: Expression,
    #[serde(default)]
    pub output: OutputMode,
}

impl Step {
    /// Parse expression text into an overwriting step.
    pub fn parse(text: &str) -> Self {
        Self {
            expression: expression::parse(text),
            output: OutputMode::Overwrite,
        }
    }

    /// Set the output mode.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

impl From<&Transformation> for Step {
    fn from(t: &Transformation) -> Self {
        Step::parse(&t.expression).with_output(t.output.clone())
    }
}

/// How a step evaluates, resolved once per step.
enum Plan<'a> {
    /// The step leaves every row unchanged.
    Identity,
    /// Copy another column's value.
    Column(&'a str),
    /// Call a function.
    Call {
        function: &'a str,
        subject: Option<&'a str>,
        params: &'a [Argument],
    },
}

/// An ordered chain of steps for one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    column: String,
    steps: Vec<Step>,
}

impl Pipeline {
    /// Create a pipeline from explicit steps.
    pub fn new(column: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            column: column.into(),
            steps,
        }
    }

    /// Build the committed chain of `column` from stored transformations.
    ///
    /// Only active and applied records targeting `column` take part. They
    /// run in ascending sequence order; ties fall back to creation time and
    /// then id.
    pub fn from_transformations<'a>(
        column: impl Into<String>,
        transformations: impl IntoIterator<Item = &'a Transformation>,
    ) -> Self {
        let column = column.into();
        let mut chain: Vec<&Transformation> = transformations
            .into_iter()
            .filter(|t| t.is_live() && t.target_column == column)
            .collect();
        chain.sort_by(|a, b| {
            a.sequence_number
                .cmp(&b.sequence_number)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let steps = chain.into_iter().map(Step::from).collect();
        Self { column, steps }
    }

    /// Target column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Steps in application order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Evaluate the chain over `rows`, returning derived copies.
    ///
    /// The input rows are never modified.
    pub fn apply(&self, library: &FunctionLibrary, rows: &[Row]) -> Vec<Row> {
        let ctx = library.context();
        let mut working = rows.to_vec();
        for step in &self.steps {
            self.apply_step(library, &ctx, step, &mut working);
        }
        working
    }

    /// Evaluate the chain over bare values of the target column.
    pub fn apply_values(&self, library: &FunctionLibrary, values: &[Value]) -> Vec<Value> {
        let rows: Vec<Row> = values
            .iter()
            .map(|v| Row::from([(self.column.clone(), v.clone())]))
            .collect();
        self.apply(library, &rows)
            .into_iter()
            .map(|mut row| row.shift_remove(&self.column).unwrap_or_default())
            .collect()
    }

    fn plan<'a>(&'a self, library: &FunctionLibrary, step: &'a Step, sample: Option<&Row>) -> Plan<'a> {
        match &step.expression {
            Expression::Opaque { .. } => Plan::Identity,
            Expression::Call(ParsedExpression { function_name, .. })
                if library.spec(function_name).is_none() =>
            {
                tracing::debug!(function = %function_name, "unknown function, step is identity");
                Plan::Identity
            }
            Expression::Call(call) => {
                let declared = library
                    .spec(&call.function_name)
                    .map_or(0, |spec| if spec.variadic { usize::MAX } else { spec.params.len() });
                // A token names the subject when it is a column, or when there
                // is one argument more than the function takes.
                let (subject, params) = call.split_subject(|name| {
                    name == self.column
                        || sample.is_some_and(|row| row.contains_key(name))
                        || call.args.len() > declared
                });
                Plan::Call {
                    function: &call.function_name,
                    subject,
                    params,
                }
            }
            Expression::Bare { name } => {
                let is_column = sample.is_some_and(|row| row.contains_key(name.as_str()));
                if name == &self.column {
                    Plan::Identity
                } else if is_column {
                    Plan::Column(name)
                } else if library.spec(name).is_some() {
                    Plan::Call {
                        function: name,
                        subject: None,
                        params: &[],
                    }
                } else {
                    Plan::Identity
                }
            }
        }
    }

    /// The value a call reads: another column named by the subject, or the
    /// chain value.
    fn input(&self, row: &Row, subject: Option<&str>) -> Value {
        let source = match subject {
            Some(name) if name != self.column && row.contains_key(name) => name,
            _ => self.column.as_str(),
        };
        row.get(source).cloned().unwrap_or_default()
    }

    fn apply_step(&self, library: &FunctionLibrary, ctx: &EvalContext, step: &Step, rows: &mut [Row]) {
        let threshold = library.config().parallel_threshold;

        let outputs: Vec<Value> = match self.plan(library, step, rows.first()) {
            Plan::Identity => return,
            Plan::Column(name) => rows
                .iter()
                .map(|row| row.get(name).cloned().unwrap_or_default())
                .collect(),
            Plan::Call {
                function,
                subject,
                params,
            } if library.is_aggregate(function) => {
                let inputs: Vec<Value> = rows.iter().map(|row| self.input(row, subject)).collect();
                let args: Vec<Value> = params.iter().map(Argument::literal).collect();
                match library.prepare(function, &inputs, &args) {
                    Some(stat) => map_slice(&inputs, threshold, |v| {
                        stat.map(v).unwrap_or_else(|| v.clone())
                    }),
                    None => inputs,
                }
            }
            Plan::Call {
                function,
                subject,
                params,
            } => map_slice(rows, threshold, |row| {
                let input = self.input(row, subject);
                let args: Vec<Value> = params.iter().map(|a| a.resolve(row)).collect();
                library.apply_with(ctx, function, &input, &args)
            }),
        };

        let target = match &step.output {
            OutputMode::Overwrite => self.column.as_str(),
            OutputMode::NewColumn { name } => name.as_str(),
        };
        for (row, value) in rows.iter_mut().zip(outputs) {
            if value.is_null() && !row.contains_key(target) {
                continue;
            }
            row.insert(target.to_string(), value);
        }
    }
}
