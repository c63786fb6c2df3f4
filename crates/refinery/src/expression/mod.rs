//! Expression parsing.
//!
//! Transformations are written as flat function calls such as
//! `REPLACE(name, "a", "b")`. There are no operators and no nested calls.

mod ast;
mod parser;

pub use ast::{Argument, Expression, ParsedExpression};
pub use parser::{leading_function_name, parse};
