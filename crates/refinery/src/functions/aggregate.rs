//! Whole-column transform functions.
//!
//! Each function computes a statistic over the numeric cells of a column and
//! returns a [`ColumnStatistic`] that maps individual cells. Non-numeric
//! cells are left unchanged, and a column without numeric cells yields no
//! statistic.

use crate::dataset::{Value, format_number};

use super::library::{Args, ColumnStatistic};

fn numeric(values: &[Value]) -> Vec<f64> {
    values.iter().filter_map(Value::as_number).collect()
}

fn sorted_numeric(values: &[Value]) -> Option<Vec<f64>> {
    let mut nums = numeric(values);
    if nums.is_empty() {
        return None;
    }
    nums.sort_by(f64::total_cmp);
    Some(nums)
}

fn bounds(nums: &[f64]) -> Option<(f64, f64)> {
    let min = nums.iter().copied().reduce(f64::min)?;
    let max = nums.iter().copied().reduce(f64::max)?;
    Some((min, max))
}

fn explicit(args: &Args<'_>, index: usize) -> Option<f64> {
    args.get(index).filter(|v| !v.is_blank())?.as_number()
}

struct MinMax {
    lo: f64,
    hi: f64,
    new_lo: f64,
    new_hi: f64,
}

impl ColumnStatistic for MinMax {
    fn map(&self, value: &Value) -> Option<Value> {
        let x = value.as_number()?;
        let span = self.hi - self.lo;
        if span == 0.0 {
            return Some(Value::number(self.new_lo));
        }
        let ratio = (x - self.lo) / span;
        Some(Value::number(self.new_lo + ratio * (self.new_hi - self.new_lo)))
    }
}

pub(crate) fn normalize(values: &[Value], args: &Args<'_>) -> Option<Box<dyn ColumnStatistic>> {
    let (min, max) = bounds(&numeric(values))?;
    Some(Box::new(MinMax {
        lo: explicit(args, 0).unwrap_or(min),
        hi: explicit(args, 1).unwrap_or(max),
        new_lo: 0.0,
        new_hi: 1.0,
    }))
}

pub(crate) fn scale(values: &[Value], args: &Args<'_>) -> Option<Box<dyn ColumnStatistic>> {
    let (lo, hi) = bounds(&numeric(values))?;
    Some(Box::new(MinMax {
        lo,
        hi,
        new_lo: args.number(0)?,
        new_hi: args.number(1)?,
    }))
}

struct ZScore {
    mean: f64,
    std_dev: f64,
}

impl ColumnStatistic for ZScore {
    fn map(&self, value: &Value) -> Option<Value> {
        let x = value.as_number()?;
        if self.std_dev == 0.0 {
            return Some(Value::number(0.0));
        }
        Some(Value::number((x - self.mean) / self.std_dev))
    }
}

/// Uses the population standard deviation.
pub(crate) fn standardize(values: &[Value], _: &Args<'_>) -> Option<Box<dyn ColumnStatistic>> {
    let nums = numeric(values);
    if nums.is_empty() {
        return None;
    }
    let n = nums.len() as f64;
    let mean = nums.iter().sum::<f64>() / n;
    let variance = nums.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(Box::new(ZScore {
        mean,
        std_dev: variance.sqrt(),
    }))
}

struct Rank {
    sorted: Vec<f64>,
    descending: bool,
}

impl ColumnStatistic for Rank {
    fn map(&self, value: &Value) -> Option<Value> {
        let x = value.as_number()?;
        let ahead = if self.descending {
            self.sorted.len() - self.sorted.partition_point(|v| *v <= x)
        } else {
            self.sorted.partition_point(|v| *v < x)
        };
        Some(Value::number((ahead + 1) as f64))
    }
}

/// Competition ranking: ties share the lowest rank and leave a gap.
pub(crate) fn rank(values: &[Value], args: &Args<'_>) -> Option<Box<dyn ColumnStatistic>> {
    let descending = match args.text(0)?.trim().to_lowercase().as_str() {
        "asc" | "ascending" => false,
        "desc" | "descending" => true,
        _ => return None,
    };
    Some(Box::new(Rank {
        sorted: sorted_numeric(values)?,
        descending,
    }))
}

struct Bucket {
    size: f64,
}

impl ColumnStatistic for Bucket {
    fn map(&self, value: &Value) -> Option<Value> {
        let x = value.as_number()?;
        let lo = (x / self.size).floor() * self.size;
        let label = format!("{}-{}", format_number(lo), format_number(lo + self.size));
        Some(Value::Text(label))
    }
}

/// Fixed-width buckets anchored at multiples of `size`.
pub(crate) fn bucket(values: &[Value], args: &Args<'_>) -> Option<Box<dyn ColumnStatistic>> {
    let size = args.number(0).filter(|s| *s > 0.0)?;
    if numeric(values).is_empty() {
        return None;
    }
    Some(Box::new(Bucket { size }))
}

struct Percentile {
    sorted: Vec<f64>,
}

impl ColumnStatistic for Percentile {
    fn map(&self, value: &Value) -> Option<Value> {
        let x = value.as_number()?;
        let at_or_below = self.sorted.partition_point(|v| *v <= x);
        let pct = at_or_below as f64 / self.sorted.len() as f64 * 100.0;
        Some(Value::number((pct * 100.0).round() / 100.0))
    }
}

pub(crate) fn percentile(values: &[Value], _: &Args<'_>) -> Option<Box<dyn ColumnStatistic>> {
    Some(Box::new(Percentile {
        sorted: sorted_numeric(values)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(xs: &[f64]) -> Vec<Value> {
        xs.iter().map(|x| Value::number(*x)).collect()
    }

    fn run(
        f: crate::functions::AggregateFn,
        values: &[Value],
        args: &[Value],
    ) -> Option<Vec<Value>> {
        let stat = f(values, &Args::new(args))?;
        Some(
            values
                .iter()
                .map(|v| stat.map(v).unwrap_or_else(|| v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_normalize_column_bounds() {
        let out = run(normalize, &nums(&[10.0, 20.0, 30.0]), &[]).unwrap();
        assert_eq!(out, nums(&[0.0, 0.5, 1.0]));
    }

    #[test]
    fn test_normalize_explicit_bounds_and_zero_span() {
        let out = run(normalize, &nums(&[5.0]), &[Value::number(0.0), Value::number(10.0)]).unwrap();
        assert_eq!(out, nums(&[0.5]));
        let flat = run(normalize, &nums(&[3.0, 3.0]), &[]).unwrap();
        assert_eq!(flat, nums(&[0.0, 0.0]));
    }

    #[test]
    fn test_non_numeric_cells_pass_through() {
        let values = vec![Value::number(0.0), Value::text("n/a"), Value::number(4.0), Value::Null];
        let out = run(normalize, &values, &[]).unwrap();
        assert_eq!(
            out,
            vec![Value::number(0.0), Value::text("n/a"), Value::number(1.0), Value::Null]
        );
    }

    #[test]
    fn test_no_numeric_cells_is_no_statistic() {
        let values = vec![Value::text("a"), Value::Null];
        assert!(normalize(&values, &Args::new(&[])).is_none());
        assert!(rank(&values, &Args::new(&[Value::text("asc")])).is_none());
        assert!(percentile(&values, &Args::new(&[])).is_none());
    }

    #[test]
    fn test_standardize_population() {
        let out = run(standardize, &nums(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), &[]).unwrap();
        assert_eq!(out[0], Value::number(-1.5));
        assert_eq!(out[7], Value::number(2.0));
        let flat = run(standardize, &nums(&[1.0, 1.0]), &[]).unwrap();
        assert_eq!(flat, nums(&[0.0, 0.0]));
    }

    #[test]
    fn test_rank_competition() {
        let values = nums(&[10.0, 20.0, 20.0, 30.0]);
        let asc = run(rank, &values, &[Value::text("asc")]).unwrap();
        assert_eq!(asc, nums(&[1.0, 2.0, 2.0, 4.0]));
        let desc = run(rank, &values, &[Value::text("desc")]).unwrap();
        assert_eq!(desc, nums(&[4.0, 2.0, 2.0, 1.0]));
        assert!(rank(&values, &Args::new(&[Value::text("sideways")])).is_none());
    }

    #[test]
    fn test_bucket_labels() {
        let out = run(bucket, &nums(&[0.0, 9.0, 10.0, 25.0, -1.0]), &[Value::number(10.0)]).unwrap();
        assert_eq!(
            out,
            vec![
                Value::text("0-10"),
                Value::text("0-10"),
                Value::text("10-20"),
                Value::text("20-30"),
                Value::text("-10-0"),
            ]
        );
        assert!(bucket(&nums(&[1.0]), &Args::new(&[Value::number(0.0)])).is_none());
    }

    #[test]
    fn test_percentile() {
        let out = run(percentile, &nums(&[1.0, 2.0, 3.0]), &[]).unwrap();
        assert_eq!(out, nums(&[33.33, 66.67, 100.0]));
    }

    #[test]
    fn test_scale() {
        let args = [Value::number(0.0), Value::number(100.0)];
        let out = run(scale, &nums(&[1.0, 3.0, 5.0]), &args).unwrap();
        assert_eq!(out, nums(&[0.0, 50.0, 100.0]));
        let flat = run(scale, &nums(&[2.0, 2.0]), &[Value::number(5.0), Value::number(9.0)]).unwrap();
        assert_eq!(flat, nums(&[5.0, 5.0]));
    }
}
