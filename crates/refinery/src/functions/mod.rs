//! The function library: a fixed catalog of named functions.
//!
//! Scalar functions map one value at a time. Transform functions are
//! aggregates: they compute a statistic over the whole column first and then
//! map each cell with it.

mod aggregate;
pub mod catalog;
mod date;
mod library;
mod math;
mod string;
mod utility;

pub use catalog::{
    AggregateFn, Evaluator, FunctionKind, FunctionSpec, FunctionType, ParamSpec, ScalarFn, catalog,
    lookup,
};
pub use date::parse_date;
pub use library::{Args, ColumnStatistic, EvalContext, FunctionLibrary};
