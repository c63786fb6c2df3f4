//! Date functions.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};

use crate::dataset::Value;

use super::library::{Args, EvalContext};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a date in any of the accepted layouts.
///
/// Slash dates are read month-first; `DD/MM/YYYY` is only used when the
/// month-first reading is impossible.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn date_of(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Text(s) => parse_date(s),
        _ => None,
    }
}

fn iso(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

pub(crate) fn format_date(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let date = date_of(value)?;
    let pattern = match args.text(0)?.trim().to_uppercase().as_str() {
        "YYYY-MM-DD" => "%Y-%m-%d",
        "MM/DD/YYYY" => "%m/%d/%Y",
        "DD/MM/YYYY" => "%d/%m/%Y",
        "YYYY" => "%Y",
        "MM" => "%m",
        "DD" => "%d",
        _ => return None,
    };
    Some(Value::Text(date.format(pattern).to_string()))
}

pub(crate) fn extract_year(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    date_of(value).map(|d| Value::number(f64::from(d.year())))
}

pub(crate) fn extract_month(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    date_of(value).map(|d| Value::number(f64::from(d.month())))
}

pub(crate) fn extract_day(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    date_of(value).map(|d| Value::number(f64::from(d.day())))
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

/// Month and year arithmetic clamps to the end of the month.
pub(crate) fn date_add(value: &Value, args: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let date = date_of(value)?;
    let amount = args.integer(0)?;
    let unit = args.text(1)?.trim().to_lowercase();

    let shifted = match unit.trim_end_matches('s') {
        "day" | "d" => shift_days(date, amount),
        "week" | "w" => shift_days(date, amount.checked_mul(7)?),
        "month" | "m" => shift_months(date, amount),
        "year" | "y" => shift_months(date, amount.checked_mul(12)?),
        _ => None,
    }?;
    Some(iso(shifted))
}

pub(crate) fn weekday(value: &Value, _: &Args<'_>, _: &EvalContext) -> Option<Value> {
    let name = match date_of(value)?.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    };
    Some(Value::text(name))
}

/// `end - start` in days. The end defaults to today.
pub(crate) fn days_between(value: &Value, args: &Args<'_>, ctx: &EvalContext) -> Option<Value> {
    let start = date_of(value)?;
    let end = match args.get(0) {
        Some(v) if !v.is_blank() => date_of(v)?,
        _ => ctx.today,
    };
    Some(Value::number((end - start).num_days() as f64))
}

pub(crate) fn age_in_years(value: &Value, _: &Args<'_>, ctx: &EvalContext) -> Option<Value> {
    let born = date_of(value)?;
    let today = ctx.today;
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    Some(Value::number(f64::from(years)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IfSemantics;

    fn ctx() -> EvalContext {
        EvalContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            if_semantics: IfSemantics::Existence,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn call(f: crate::functions::ScalarFn, value: &str, args: &[Value]) -> Option<Value> {
        f(&Value::text(value), &Args::new(args), &ctx())
    }

    #[test]
    fn test_parse_date_layouts() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024/01/15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("25/12/2023"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_date("15.01.2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T10:30:00Z"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T10:30:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 10:30:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("Jan 15, 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("January 15, 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_format_date() {
        let us = [Value::text("MM/DD/YYYY")];
        assert_eq!(call(format_date, "2024-01-15", &us), Some(Value::text("01/15/2024")));
        let year = [Value::text("YYYY")];
        assert_eq!(call(format_date, "2024-01-15", &year), Some(Value::text("2024")));
        let unknown = [Value::text("QQ")];
        assert_eq!(call(format_date, "2024-01-15", &unknown), None);
        assert_eq!(call(format_date, "garbage", &us), None);
    }

    #[test]
    fn test_extract_parts() {
        assert_eq!(call(extract_year, "2024-03-09", &[]), Some(Value::number(2024.0)));
        assert_eq!(call(extract_month, "2024-03-09", &[]), Some(Value::number(3.0)));
        assert_eq!(call(extract_day, "2024-03-09", &[]), Some(Value::number(9.0)));
    }

    #[test]
    fn test_date_add_units() {
        let days = [Value::number(10.0), Value::text("days")];
        assert_eq!(call(date_add, "2024-01-25", &days), Some(Value::text("2024-02-04")));
        let weeks = [Value::number(-1.0), Value::text("week")];
        assert_eq!(call(date_add, "2024-01-08", &weeks), Some(Value::text("2024-01-01")));
        let years = [Value::number(1.0), Value::text("years")];
        assert_eq!(call(date_add, "2024-02-29", &years), Some(Value::text("2025-02-28")));
        let bad = [Value::number(1.0), Value::text("fortnights")];
        assert_eq!(call(date_add, "2024-01-01", &bad), None);
    }

    #[test]
    fn test_date_add_month_clamps() {
        let one_month = [Value::number(1.0), Value::text("months")];
        assert_eq!(call(date_add, "2024-01-31", &one_month), Some(Value::text("2024-02-29")));
    }

    #[test]
    fn test_weekday() {
        assert_eq!(call(weekday, "2024-01-15", &[]), Some(Value::text("Monday")));
    }

    #[test]
    fn test_days_between() {
        let end = [Value::text("2024-01-31")];
        assert_eq!(call(days_between, "2024-01-01", &end), Some(Value::number(30.0)));
        assert_eq!(call(days_between, "2024-06-10", &[]), Some(Value::number(5.0)));
    }

    #[test]
    fn test_age_in_years() {
        assert_eq!(call(age_in_years, "2000-06-15", &[]), Some(Value::number(24.0)));
        assert_eq!(call(age_in_years, "2000-06-16", &[]), Some(Value::number(23.0)));
        assert_eq!(call(age_in_years, "yesterday", &[]), None);
    }
}
