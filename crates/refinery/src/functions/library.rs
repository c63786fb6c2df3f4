//! Function dispatch.

use chrono::NaiveDate;

use crate::config::{EngineConfig, IfSemantics};
use crate::dataset::Value;

use super::catalog::{self, Evaluator, FunctionSpec};

/// Per-run evaluation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    /// Date treated as "today".
    pub today: NaiveDate,
    /// Truthiness rule for `IF`.
    pub if_semantics: IfSemantics,
}

/// Positional view over resolved arguments (defaults already filled in).
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Wrap resolved argument values.
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index`.
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Argument at `index` coerced to a number.
    pub fn number(&self, index: usize) -> Option<f64> {
        self.get(index)?.as_number()
    }

    /// Argument at `index` as a whole number, truncating any fraction.
    pub fn integer(&self, index: usize) -> Option<i64> {
        self.number(index).map(|n| n.trunc() as i64)
    }

    /// Argument at `index` as a non-negative count.
    pub fn count(&self, index: usize) -> Option<usize> {
        self.integer(index)
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Argument at `index` rendered as text.
    pub fn text(&self, index: usize) -> Option<String> {
        self.get(index).map(Value::to_text)
    }

    /// Arguments from `index` onwards.
    pub fn rest(&self, index: usize) -> &'a [Value] {
        self.values.get(index..).unwrap_or(&[])
    }
}

/// A column-level statistic computed in the first phase of an aggregate
/// function, used to map each cell in the second phase.
pub trait ColumnStatistic: Send + Sync {
    /// Map one cell. `None` leaves the cell unchanged.
    fn map(&self, value: &Value) -> Option<Value>;
}

/// The fixed function library.
///
/// Every entry point is total: unknown functions and evaluation faults
/// return the input value unchanged.
#[derive(Debug, Clone, Default)]
pub struct FunctionLibrary {
    config: EngineConfig,
}

impl FunctionLibrary {
    /// Create a library with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the evaluation context for one run.
    pub fn context(&self) -> EvalContext {
        EvalContext {
            today: self.config.today(),
            if_semantics: self.config.if_semantics,
        }
    }

    /// Look up a function by name (case-insensitive).
    pub fn spec(&self, name: &str) -> Option<&'static FunctionSpec> {
        catalog::lookup(name)
    }

    /// Whether a function needs the whole column.
    pub fn is_aggregate(&self, name: &str) -> bool {
        self.spec(name).is_some_and(FunctionSpec::is_aggregate)
    }

    /// Whether a function is referentially transparent. Unknown names are
    /// identity and therefore deterministic.
    pub fn is_deterministic(&self, name: &str) -> bool {
        self.spec(name).is_none_or(|spec| spec.deterministic)
    }

    /// Apply a function to a single value.
    ///
    /// Aggregate functions are evaluated over a one-cell column.
    pub fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Value {
        self.apply_with(&self.context(), name, value, args)
    }

    /// Apply a function to a single value with an explicit context.
    pub fn apply_with(&self, ctx: &EvalContext, name: &str, value: &Value, args: &[Value]) -> Value {
        let Some(spec) = self.spec(name) else {
            tracing::debug!(function = name, "unknown function, passing value through");
            return value.clone();
        };

        let args = spec.with_defaults(args);
        match spec.eval {
            Evaluator::Scalar(f) => f(value, &Args::new(&args), ctx).unwrap_or_else(|| {
                tracing::debug!(function = spec.name, value = %value, "evaluation fault, value unchanged");
                value.clone()
            }),
            Evaluator::Aggregate(_) => self
                .prepare(name, std::slice::from_ref(value), &args)
                .and_then(|stat| stat.map(value))
                .unwrap_or_else(|| value.clone()),
        }
    }

    /// Run the statistic pass of an aggregate function over a column.
    ///
    /// Returns `None` for scalar or unknown functions, and when the column
    /// has nothing the statistic can be computed from.
    pub fn prepare(
        &self,
        name: &str,
        values: &[Value],
        args: &[Value],
    ) -> Option<Box<dyn ColumnStatistic>> {
        let spec = self.spec(name)?;
        match spec.eval {
            Evaluator::Aggregate(f) => {
                let args = spec.with_defaults(args);
                let stat = f(values, &Args::new(&args));
                if stat.is_none() {
                    tracing::debug!(function = spec.name, "no statistic for column, values unchanged");
                }
                stat
            }
            Evaluator::Scalar(_) => None,
        }
    }

    /// Apply a function to every value of a column.
    ///
    /// Aggregate functions compute their statistic over `values` first and
    /// then map each value; scalar functions map each value independently.
    pub fn apply_column(&self, name: &str, values: &[Value], args: &[Value]) -> Vec<Value> {
        if self.is_aggregate(name) {
            return match self.prepare(name, values, args) {
                Some(stat) => values
                    .iter()
                    .map(|v| stat.map(v).unwrap_or_else(|| v.clone()))
                    .collect(),
                None => values.to_vec(),
            };
        }

        let ctx = self.context();
        values
            .iter()
            .map(|v| self.apply_with(&ctx, name, v, args))
            .collect()
    }
}
