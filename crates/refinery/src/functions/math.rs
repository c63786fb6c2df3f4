//! Math functions. Inputs are coerced with [`Value::as_number`]; anything
//! non-numeric is left unchanged.

use crate::dataset::Value;

use super::library::{Args, EvalContext};

fn finite(n: f64) -> Option<Value> {
    n.is_finite().then(|| Value::number(n))
}

fn binary(value: &Value, args: &Args<'_>, op: impl FnOnce(f64, f64) -> f64) -> Option<Value> {
    let x = value.as_number()?;
    let y = args.number(0)?;
    finite(op(x, y))
}

fn unary(value: &Value, op: impl FnOnce(f64) -> f64) -> Option<Value> {
    finite(op(value.as_number()?))
}

pub(crate) fn add(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, |x, y| x + y)
}

pub(crate) fn subtract(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, |x, y| x - y)
}

pub(crate) fn multiply(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, |x, y| x * y)
}

pub(crate) fn divide(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, |x, y| if y == 0.0 { 0.0 } else { x / y })
}

pub(crate) fn modulo(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, |x, y| if y == 0.0 { 0.0 } else { x % y })
}

pub(crate) fn min(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, f64::min)
}

pub(crate) fn max(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, f64::max)
}

pub(crate) fn power(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    binary(value, args, f64::powf)
}

/// Half away from zero. Negative `decimals` round to tens, hundreds, ...
pub(crate) fn round(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let x = value.as_number()?;
    let decimals = i32::try_from(args.integer(0)?).ok()?.clamp(-15, 15);
    if decimals < 0 {
        let factor = 10f64.powi(-decimals);
        return finite((x / factor).round() * factor);
    }
    let factor = 10f64.powi(decimals);
    finite((x * factor).round() / factor)
}

pub(crate) fn ceil(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    unary(value, f64::ceil)
}

pub(crate) fn floor(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    unary(value, f64::floor)
}

pub(crate) fn abs(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    unary(value, f64::abs)
}

pub(crate) fn sqrt(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let x = value.as_number()?;
    if x < 0.0 {
        return None;
    }
    finite(x.sqrt())
}
