//! Utility functions.

use crate::config::IfSemantics;
use crate::dataset::Value;

use super::library::{Args, EvalContext};

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 8;

/// First non-blank of the value and the fallbacks; the last fallback when
/// all are blank.
pub(crate) fn coalesce(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    if !value.is_blank() {
        return Some(value.clone());
    }
    let fallbacks = args.rest(0);
    fallbacks
        .iter()
        .find(|v| !v.is_blank())
        .or(fallbacks.last())
        .cloned()
}

pub(crate) fn if_empty(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    if value.is_blank() {
        args.get(0).cloned()
    } else {
        Some(value.clone())
    }
}

fn is_truthy(value: &Value, semantics: IfSemantics) -> bool {
    if value.is_blank() {
        return false;
    }
    match semantics {
        IfSemantics::Existence => true,
        IfSemantics::Strict => match value {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => {
                let s = s.trim();
                s != "0" && !s.eq_ignore_ascii_case("false")
            }
            Value::Null => false,
        },
    }
}

pub(crate) fn if_truthy(value: &Value, args: &Args<'_>, ctx: &EvalContext) -> Option<Value> {
    let branch = if is_truthy(value, ctx.if_semantics) { 0 } else { 1 };
    args.get(branch).cloned()
}

pub(crate) fn generate_id(_: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let suffix: String = (0..ID_LENGTH)
        .map(|_| char::from(ID_ALPHABET[fastrand::usize(..ID_ALPHABET.len())]))
        .collect();
    let prefix = args.text(0).unwrap_or_default();
    let id = if prefix.is_empty() {
        suffix
    } else {
        format!("{}_{}", prefix, suffix)
    };
    Some(Value::Text(id))
}

pub(crate) fn duplicate(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    Some(value.clone())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn ctx(if_semantics: IfSemantics) -> EvalContext {
        EvalContext {
            today: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            if_semantics,
        }
    }

    #[test]
    fn test_coalesce() {
        let args = [Value::Null, Value::text("  "), Value::text("fallback")];
        let c = ctx(IfSemantics::Existence);
        assert_eq!(coalesce(&Value::Null, &Args::new(&args), &c), Some(Value::text("fallback")));
        assert_eq!(coalesce(&Value::text("x"), &Args::new(&args), &c), Some(Value::text("x")));
        let only_blank = [Value::text("")];
        assert_eq!(coalesce(&Value::Null, &Args::new(&only_blank), &c), Some(Value::text("")));
    }

    #[test]
    fn test_if_empty() {
        let args = [Value::text("N/A")];
        let c = ctx(IfSemantics::Existence);
        assert_eq!(if_empty(&Value::text(" "), &Args::new(&args), &c), Some(Value::text("N/A")));
        assert_eq!(if_empty(&Value::number(0.0), &Args::new(&args), &c), Some(Value::number(0.0)));
    }

    #[test]
    fn test_if_existence_semantics() {
        let args = [Value::text("yes"), Value::text("no")];
        let c = ctx(IfSemantics::Existence);
        assert_eq!(if_truthy(&Value::text("0"), &Args::new(&args), &c), Some(Value::text("yes")));
        assert_eq!(if_truthy(&Value::Null, &Args::new(&args), &c), Some(Value::text("no")));
    }

    #[test]
    fn test_if_strict_semantics() {
        let args = [Value::text("yes"), Value::text("no")];
        let c = ctx(IfSemantics::Strict);
        for falsy in [Value::text("0"), Value::text("FALSE"), Value::number(0.0), Value::Bool(false)] {
            assert_eq!(if_truthy(&falsy, &Args::new(&args), &c), Some(Value::text("no")));
        }
        assert_eq!(if_truthy(&Value::text("x"), &Args::new(&args), &c), Some(Value::text("yes")));
    }

    #[test]
    fn test_generate_id_shape() {
        let c = ctx(IfSemantics::Existence);
        let id = generate_id(&Value::Null, &Args::new(&[Value::text("usr")]), &c).unwrap().to_text();
        let suffix = id.strip_prefix("usr_").unwrap();
        assert_eq!(suffix.len(), ID_LENGTH);
        assert!(suffix.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));
    }
}
