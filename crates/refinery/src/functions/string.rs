//! String functions. Lengths and positions count characters, not bytes.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::dataset::Value;

use super::library::{Args, EvalContext};

/// Compiled `/pattern/` arguments, keyed by the raw argument text.
static PATTERNS: Lazy<Mutex<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_text()),
    }
}

fn map_text(value: &Value, f: impl FnOnce(&str) -> String) -> Option<Value> {
    text_of(value).map(|s| Value::Text(f(&s)))
}

pub(crate) fn uppercase(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, str::to_uppercase)
}

pub(crate) fn lowercase(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, str::to_lowercase)
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub(crate) fn capitalize(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, capitalize_word)
}

pub(crate) fn title_case(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, |s| {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for c in s.chars() {
            if c.is_whitespace() {
                out.push(c);
                at_word_start = true;
            } else if at_word_start {
                out.extend(c.to_uppercase());
                at_word_start = false;
            } else {
                out.extend(c.to_lowercase());
            }
        }
        out
    })
}

pub(crate) fn trim(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, |s| s.trim().to_string())
}

pub(crate) fn reverse(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, |s| s.chars().rev().collect())
}

pub(crate) fn length(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let len = text_of(value).map_or(0, |s| s.chars().count());
    Some(Value::number(len as f64))
}

fn is_printable(c: char) -> bool {
    !c.is_control() && !matches!(c, '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{FEFF}')
}

pub(crate) fn clean(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, |s| s.chars().filter(|c| is_printable(*c)).collect())
}

pub(crate) fn remove_spaces(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    map_text(value, |s| s.chars().filter(|c| !c.is_whitespace()).collect())
}

pub(crate) fn left(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let n = args.count(0)?;
    map_text(value, |s| s.chars().take(n).collect())
}

pub(crate) fn right(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let n = args.count(0)?;
    map_text(value, |s| {
        let len = s.chars().count();
        s.chars().skip(len.saturating_sub(n)).collect()
    })
}

pub(crate) fn substring(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let start = args.count(0)?;
    let length = match args.get(1) {
        Some(v) if !v.is_blank() => Some(args.count(1)?),
        _ => None,
    };
    map_text(value, |s| {
        let chars = s.chars().skip(start);
        match length {
            Some(len) => chars.take(len).collect(),
            None => chars.collect(),
        }
    })
}

/// Split `/pattern/flags` into its parts. Only the `i` flag is recognized.
fn regex_literal(search: &str) -> Option<(&str, bool)> {
    let body = search.strip_prefix('/')?;
    let end = body.rfind('/')?;
    let (pattern, flags) = (&body[..end], &body[end + 1..]);
    if pattern.is_empty() || !flags.chars().all(|c| c == 'i') {
        return None;
    }
    Some((pattern, flags.contains('i')))
}

fn compiled(search: &str, pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let mut cache = PATTERNS.lock().unwrap_or_else(|e| e.into_inner());
    cache
        .entry(search.to_string())
        .or_insert_with(|| {
            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .ok()
        })
        .clone()
}

pub(crate) fn replace(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let search = args.text(0)?;
    let replacement = args.text(1).unwrap_or_default();
    if search.is_empty() {
        return None;
    }
    let input = text_of(value)?;

    if let Some((pattern, case_insensitive)) = regex_literal(&search) {
        let re = compiled(&search, pattern, case_insensitive)?;
        return Some(Value::Text(re.replace_all(&input, replacement.as_str()).into_owned()));
    }
    Some(Value::Text(input.replace(&search, &replacement)))
}

pub(crate) fn split(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let delimiter = args.text(0)?;
    let index = args.count(1)?;
    if delimiter.is_empty() {
        return None;
    }
    map_text(value, |s| {
        s.split(delimiter.as_str())
            .nth(index)
            .unwrap_or_default()
            .to_string()
    })
}

fn pad_char(args: &Args<'_>) -> Option<char> {
    args.text(1)?.chars().next()
}

/// Widest padding allowed. Larger widths are a fault.
const MAX_PAD_WIDTH: usize = u16::MAX as usize;

fn pad_width(args: &Args<'_>) -> Option<usize> {
    args.count(0).filter(|width| *width <= MAX_PAD_WIDTH)
}

pub(crate) fn pad_left(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let width = pad_width(args)?;
    let fill = pad_char(args)?;
    map_text(value, |s| {
        let missing = width.saturating_sub(s.chars().count());
        std::iter::repeat_n(fill, missing).chain(s.chars()).collect()
    })
}

pub(crate) fn pad_right(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let width = pad_width(args)?;
    let fill = pad_char(args)?;
    map_text(value, |s| {
        let missing = width.saturating_sub(s.chars().count());
        s.chars().chain(std::iter::repeat_n(fill, missing)).collect()
    })
}

pub(crate) fn concat(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let separator = args.text(0).unwrap_or_default();
    let parts: Vec<String> = std::iter::once(value)
        .chain(args.rest(1))
        .filter(|v| !v.is_null())
        .map(Value::to_text)
        .collect();
    Some(Value::Text(parts.join(&separator)))
}
