//! The function catalog and dispatch table.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::dataset::Value;

use super::library::{Args, ColumnStatistic, EvalContext};
use super::{aggregate, date, math, string, utility};

/// Per-value evaluator. `None` signals a fault; the caller keeps the input.
pub type ScalarFn = fn(&Value, &Args<'_>, &EvalContext) -> Option<Value>;

/// Statistic pass of a whole-column function.
pub type AggregateFn = fn(&[Value], &Args<'_>) -> Option<Box<dyn ColumnStatistic>>;

/// Category tag of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    String,
    Math,
    Date,
    #[default]
    Utility,
    Transform,
}

impl FunctionType {
    /// Lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            FunctionType::String => "string",
            FunctionType::Math => "math",
            FunctionType::Date => "date",
            FunctionType::Utility => "utility",
            FunctionType::Transform => "transform",
        }
    }

    /// Category of the function an expression starts with. Unknown names are
    /// `utility`.
    pub fn of_expression(expression: &str) -> Self {
        crate::expression::leading_function_name(expression)
            .and_then(|name| lookup(&name))
            .map(|spec| spec.category)
            .unwrap_or_default()
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a function works per value or over the whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Scalar,
    Aggregate,
}

/// A positional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Default used when the argument is omitted. `None` means required.
    pub default: Option<&'static str>,
}

/// Evaluator attached to a catalog entry.
#[derive(Clone, Copy)]
pub enum Evaluator {
    Scalar(ScalarFn),
    Aggregate(AggregateFn),
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluator::Scalar(_) => f.write_str("Scalar"),
            Evaluator::Aggregate(_) => f.write_str("Aggregate"),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub category: FunctionType,
    pub kind: FunctionKind,
    pub deterministic: bool,
    /// Accepts extra arguments after the declared parameters.
    pub variadic: bool,
    pub params: &'static [ParamSpec],
    pub description: &'static str,
    #[serde(skip)]
    pub eval: Evaluator,
}

impl FunctionSpec {
    const fn scalar(
        name: &'static str,
        category: FunctionType,
        params: &'static [ParamSpec],
        description: &'static str,
        f: ScalarFn,
    ) -> Self {
        Self {
            name,
            category,
            kind: FunctionKind::Scalar,
            deterministic: true,
            variadic: false,
            params,
            description,
            eval: Evaluator::Scalar(f),
        }
    }

    const fn aggregate(
        name: &'static str,
        params: &'static [ParamSpec],
        description: &'static str,
        f: AggregateFn,
    ) -> Self {
        Self {
            name,
            category: FunctionType::Transform,
            kind: FunctionKind::Aggregate,
            deterministic: true,
            variadic: false,
            params,
            description,
            eval: Evaluator::Aggregate(f),
        }
    }

    const fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    const fn nondeterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    /// Whether this function needs the whole column.
    pub fn is_aggregate(&self) -> bool {
        self.kind == FunctionKind::Aggregate
    }

    /// Append defaults for omitted trailing parameters, stopping at the first
    /// required one.
    pub fn with_defaults(&self, args: &[Value]) -> Vec<Value> {
        let mut filled = args.to_vec();
        for param in self.params.iter().skip(args.len()) {
            match param.default {
                Some(default) => filled.push(Value::text(default)),
                None => break,
            }
        }
        filled
    }
}

use FunctionType::{Date, Math, String as Str, Utility};

/// Every function the engine knows, in display order.
pub static CATALOG: &[FunctionSpec] = &[
    // String
    FunctionSpec::scalar("UPPERCASE", Str, &[], "Convert text to upper case", string::uppercase),
    FunctionSpec::scalar("LOWERCASE", Str, &[], "Convert text to lower case", string::lowercase),
    FunctionSpec::scalar(
        "CAPITALIZE",
        Str,
        &[],
        "Upper-case the first character and lower-case the rest",
        string::capitalize,
    ),
    FunctionSpec::scalar("TITLE_CASE", Str, &[], "Capitalize every word", string::title_case),
    FunctionSpec::scalar("TRIM", Str, &[], "Remove leading and trailing whitespace", string::trim),
    FunctionSpec::scalar("REVERSE", Str, &[], "Reverse the characters", string::reverse),
    FunctionSpec::scalar("LENGTH", Str, &[], "Number of characters", string::length),
    FunctionSpec::scalar("CLEAN", Str, &[], "Strip non-printable characters", string::clean),
    FunctionSpec::scalar("REMOVE_SPACES", Str, &[], "Remove all whitespace", string::remove_spaces),
    FunctionSpec::scalar("LEFT", Str, &[ParamSpec { name: "length", default: Some("1") }], "First n characters", string::left),
    FunctionSpec::scalar("RIGHT", Str, &[ParamSpec { name: "length", default: Some("1") }], "Last n characters", string::right),
    FunctionSpec::scalar(
        "SUBSTRING",
        Str,
        &[ParamSpec { name: "start", default: Some("0") }, ParamSpec { name: "length", default: None }],
        "Characters from a 0-based start, optionally limited to a length",
        string::substring,
    ),
    FunctionSpec::scalar(
        "REPLACE",
        Str,
        &[ParamSpec { name: "search", default: None }, ParamSpec { name: "replacement", default: Some("") }],
        "Replace every occurrence; /pattern/ or /pattern/i is a regular expression",
        string::replace,
    ),
    FunctionSpec::scalar(
        "SPLIT",
        Str,
        &[ParamSpec { name: "delimiter", default: Some(",") }, ParamSpec { name: "index", default: Some("0") }],
        "Split on a delimiter and take the part at a 0-based index",
        string::split,
    ),
    FunctionSpec::scalar(
        "PAD_LEFT",
        Str,
        &[ParamSpec { name: "length", default: None }, ParamSpec { name: "char", default: Some("0") }],
        "Pad on the left to a minimum length",
        string::pad_left,
    ),
    FunctionSpec::scalar(
        "PAD_RIGHT",
        Str,
        &[ParamSpec { name: "length", default: None }, ParamSpec { name: "char", default: Some(" ") }],
        "Pad on the right to a minimum length",
        string::pad_right,
    ),
    FunctionSpec::scalar(
        "CONCAT",
        Str,
        &[ParamSpec { name: "separator", default: Some("") }],
        "Join the value with further values using a separator",
        string::concat,
    )
    .variadic(),
    // Math
    FunctionSpec::scalar("ADD", Math, &[ParamSpec { name: "value", default: Some("0") }], "Add a number", math::add),
    FunctionSpec::scalar("SUBTRACT", Math, &[ParamSpec { name: "value", default: Some("0") }], "Subtract a number", math::subtract),
    FunctionSpec::scalar("MULTIPLY", Math, &[ParamSpec { name: "value", default: Some("1") }], "Multiply by a number", math::multiply),
    FunctionSpec::scalar(
        "DIVIDE",
        Math,
        &[ParamSpec { name: "value", default: Some("1") }],
        "Divide by a number; division by zero gives 0",
        math::divide,
    ),
    FunctionSpec::scalar(
        "ROUND",
        Math,
        &[ParamSpec { name: "decimals", default: Some("0") }],
        "Round half away from zero",
        math::round,
    ),
    FunctionSpec::scalar("CEIL", Math, &[], "Round up", math::ceil),
    FunctionSpec::scalar("FLOOR", Math, &[], "Round down", math::floor),
    FunctionSpec::scalar("ABS", Math, &[], "Absolute value", math::abs),
    FunctionSpec::scalar("POWER", Math, &[ParamSpec { name: "exponent", default: Some("2") }], "Raise to a power", math::power),
    FunctionSpec::scalar("SQRT", Math, &[], "Square root of a non-negative number", math::sqrt),
    FunctionSpec::scalar(
        "MOD",
        Math,
        &[ParamSpec { name: "divisor", default: None }],
        "Remainder; a zero divisor gives 0",
        math::modulo,
    ),
    FunctionSpec::scalar("MIN", Math, &[ParamSpec { name: "value", default: None }], "Smaller of the value and a number", math::min),
    FunctionSpec::scalar("MAX", Math, &[ParamSpec { name: "value", default: None }], "Larger of the value and a number", math::max),
    // Date
    FunctionSpec::scalar(
        "FORMAT_DATE",
        Date,
        &[ParamSpec { name: "format", default: Some("YYYY-MM-DD") }],
        "Reformat a date (YYYY-MM-DD, MM/DD/YYYY, DD/MM/YYYY, YYYY, MM, DD)",
        date::format_date,
    ),
    FunctionSpec::scalar("EXTRACT_YEAR", Date, &[], "Year of a date", date::extract_year),
    FunctionSpec::scalar("EXTRACT_MONTH", Date, &[], "Month of a date", date::extract_month),
    FunctionSpec::scalar("EXTRACT_DAY", Date, &[], "Day of the month of a date", date::extract_day),
    FunctionSpec::scalar(
        "DATE_ADD",
        Date,
        &[ParamSpec { name: "amount", default: Some("0") }, ParamSpec { name: "unit", default: Some("days") }],
        "Add days, weeks, months or years",
        date::date_add,
    ),
    FunctionSpec::scalar("WEEKDAY", Date, &[], "English weekday name", date::weekday),
    FunctionSpec::scalar(
        "DAYS_BETWEEN",
        Date,
        &[ParamSpec { name: "end_date", default: None }],
        "Days from the value to an end date (default today)",
        date::days_between,
    ),
    FunctionSpec::scalar(
        "AGE_IN_YEARS",
        Date,
        &[],
        "Whole years from the value to today",
        date::age_in_years,
    ),
    // Utility
    FunctionSpec::scalar(
        "COALESCE",
        Utility,
        &[ParamSpec { name: "fallback", default: Some("") }],
        "First non-blank of the value and the fallbacks",
        utility::coalesce,
    )
    .variadic(),
    FunctionSpec::scalar(
        "IF_EMPTY",
        Utility,
        &[ParamSpec { name: "default", default: Some("") }],
        "Replace a blank value with a default",
        utility::if_empty,
    ),
    FunctionSpec::scalar(
        "IF",
        Utility,
        &[ParamSpec { name: "true_value", default: Some("true") }, ParamSpec { name: "false_value", default: Some("false") }],
        "Choose a value depending on whether the input is truthy",
        utility::if_truthy,
    ),
    FunctionSpec::scalar(
        "GENERATE_ID",
        Utility,
        &[ParamSpec { name: "prefix", default: Some("id") }],
        "Random identifier with a prefix",
        utility::generate_id,
    )
    .nondeterministic(),
    FunctionSpec::scalar("DUPLICATE", Utility, &[], "Copy the value unchanged", utility::duplicate),
    // Transform
    FunctionSpec::aggregate(
        "NORMALIZE",
        &[ParamSpec { name: "min", default: None }, ParamSpec { name: "max", default: None }],
        "Rescale into [0, 1] using the column or given bounds",
        aggregate::normalize,
    ),
    FunctionSpec::aggregate(
        "STANDARDIZE",
        &[],
        "Z-score using the population standard deviation",
        aggregate::standardize,
    ),
    FunctionSpec::aggregate(
        "RANK",
        &[ParamSpec { name: "order", default: Some("asc") }],
        "1-based competition rank within the column",
        aggregate::rank,
    ),
    FunctionSpec::aggregate(
        "BUCKET",
        &[ParamSpec { name: "size", default: Some("10") }],
        "Label the fixed-width bucket containing the value",
        aggregate::bucket,
    ),
    FunctionSpec::aggregate(
        "PERCENTILE",
        &[],
        "Percent of the column at or below the value",
        aggregate::percentile,
    ),
    FunctionSpec::aggregate(
        "SCALE",
        &[ParamSpec { name: "new_min", default: Some("0") }, ParamSpec { name: "new_max", default: Some("100") }],
        "Min-max rescale into a new range",
        aggregate::scale,
    ),
];

static INDEX: Lazy<HashMap<&'static str, &'static FunctionSpec>> =
    Lazy::new(|| CATALOG.iter().map(|spec| (spec.name, spec)).collect());

/// Look up a function by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    INDEX.get(name.trim().to_uppercase().as_str()).copied()
}

/// The full catalog.
pub fn catalog() -> &'static [FunctionSpec] {
    CATALOG
}
