//! Descriptive statistics and t-statistic ranking of grouped changes.

use std::cmp::Ordering;

use serde::Serialize;

use crate::calendar::weekday_position;
use crate::config::COL_CHANGE;
use crate::engine::{Engine, Record, TableSchema};
use crate::error::{Result, VibeError};
use crate::frame::{Column, ColumnLabel, Frame, RowIndex, Scalar};
use crate::sql_builder::SqlBuilder;

/// Table the current view is loaded into for `describe`.
pub const CURRENT_TABLE: &str = "current_view";

const DESCRIBE_COLUMNS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Aggregates of one group of a grouped column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: Scalar,
    pub mean: f64,
    /// Sample standard deviation; `NaN` for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
    pub median: f64,
}

/// One row of a t-statistic ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificantGroup {
    pub key: Scalar,
    pub mean: f64,
    pub std: f64,
    pub count: u64,
    pub t_stat: f64,
}

/// `mean / (std / sqrt(count))`.
///
/// Non-finite when `count <= 1` or `std == 0` (or `std` itself is undefined).
pub fn t_statistic(mean: f64, std: f64, count: u64) -> f64 {
    if count <= 1 || std == 0.0 || !std.is_finite() {
        return f64::NAN;
    }
    mean / (std / (count as f64).sqrt())
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Per-column summary of every numeric column of `frame`.
///
/// Rows are the original columns (index level `column`); columns are
/// `count, mean, std, min, 25%, 50%, 75%, max`. Quartiles interpolate
/// linearly between order statistics.
pub fn describe(engine: &Engine, frame: &Frame) -> Result<Frame> {
    let schema = engine.register_frame(CURRENT_TABLE, frame)?;

    let mut names = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); DESCRIBE_COLUMNS.len()];
    for column in schema.numeric() {
        let c = &column.ident;
        let exprs = vec![
            format!("CAST(COUNT({c}) AS DOUBLE) AS n"),
            format!("CAST(AVG({c}) AS DOUBLE) AS mean"),
            format!("CAST(STDDEV_SAMP({c}) AS DOUBLE) AS std"),
            format!("CAST(MIN({c}) AS DOUBLE) AS lo"),
            format!("CAST(QUANTILE_CONT(CAST({c} AS DOUBLE), 0.25) AS DOUBLE) AS q1"),
            format!("CAST(QUANTILE_CONT(CAST({c} AS DOUBLE), 0.5) AS DOUBLE) AS q2"),
            format!("CAST(QUANTILE_CONT(CAST({c} AS DOUBLE), 0.75) AS DOUBLE) AS q3"),
            format!("CAST(MAX({c}) AS DOUBLE) AS hi"),
        ];
        let (sql, params) = SqlBuilder::new(&schema.table)
            .select(&[])
            .select_more(exprs)
            .build();
        let record = engine.execute(&sql, &params)?.into_iter().next().unwrap_or_default();

        names.push(Scalar::Text(column.label.clone()));
        for (slot, alias) in ["n", "mean", "std", "lo", "q1", "q2", "q3", "hi"].iter().enumerate() {
            values[slot].push(record.get(*alias).and_then(Scalar::as_f64));
        }
    }

    let columns = DESCRIBE_COLUMNS
        .iter()
        .zip(values)
        .map(|(name, v)| (ColumnLabel::new(name), Column::Float(v)))
        .collect();
    Frame::new(RowIndex::keys("column", names), columns)
}

/// Mean, std, min, max, count and median of `column` for every value of `by`.
///
/// Groups are ordered by key; weekday names sort in calendar order.
pub fn grouped_stats(
    engine: &Engine,
    schema: &TableSchema,
    by: &str,
    column: &str,
) -> Result<Vec<GroupStats>> {
    let key = &schema.require(by)?.ident;
    let target = schema.require(column)?;
    if !target.numeric {
        return Err(VibeError::InvalidArgument(format!(
            "column '{}' is not numeric",
            column
        )));
    }
    let v = &target.ident;

    let (sql, params) = SqlBuilder::new(&schema.table)
        .select(&[])
        .select_more(vec![
            format!("{key} AS grp"),
            format!("CAST(AVG({v}) AS DOUBLE) AS mean"),
            format!("CAST(STDDEV_SAMP({v}) AS DOUBLE) AS std"),
            format!("CAST(MIN({v}) AS DOUBLE) AS lo"),
            format!("CAST(MAX({v}) AS DOUBLE) AS hi"),
            format!("COUNT({v}) AS n"),
            format!("CAST(MEDIAN(CAST({v} AS DOUBLE)) AS DOUBLE) AS med"),
        ])
        .where_clause(&format!("{key} IS NOT NULL"), &[])
        .group_by(&[key.as_str()])
        .build();

    let mut groups: Vec<GroupStats> = engine
        .execute(&sql, &params)?
        .into_iter()
        .map(|record| GroupStats {
            key: record.get("grp").cloned().unwrap_or(Scalar::Null),
            mean: nan_if_null(&record, "mean"),
            std: nan_if_null(&record, "std"),
            min: nan_if_null(&record, "lo"),
            max: nan_if_null(&record, "hi"),
            count: record
                .get("n")
                .and_then(Scalar::as_i64)
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0),
            median: nan_if_null(&record, "med"),
        })
        .collect();

    groups.sort_by(|a, b| key_order(&a.key, &b.key));
    Ok(groups)
}

/// t-statistic of the mean change of every group of `by`, in group order.
pub fn t_statistics(engine: &Engine, schema: &TableSchema, by: &str) -> Result<Vec<SignificantGroup>> {
    Ok(grouped_stats(engine, schema, by, COL_CHANGE)?
        .into_iter()
        .map(|g| SignificantGroup {
            t_stat: t_statistic(g.mean, g.std, g.count),
            key: g.key,
            mean: g.mean,
            std: g.std,
            count: g.count,
        })
        .collect())
}

/// Groups of `by` whose `|t|` exceeds `threshold`, strongest first.
///
/// Groups with a non-finite t-statistic are dropped. Values are rounded to
/// three decimals after ranking on the unrounded `|t|`; equal values keep
/// group order.
pub fn significant_groups(
    engine: &Engine,
    schema: &TableSchema,
    by: &str,
    threshold: f64,
) -> Result<Vec<SignificantGroup>> {
    let mut ranked: Vec<SignificantGroup> = t_statistics(engine, schema, by)?
        .into_iter()
        .filter(|g| g.t_stat.is_finite() && g.t_stat.abs() > threshold)
        .collect();

    // Rank on the unrounded values; rounding only affects what is reported.
    ranked.sort_by(|a, b| {
        b.t_stat
            .abs()
            .partial_cmp(&a.t_stat.abs())
            .unwrap_or(Ordering::Equal)
    });
    Ok(ranked
        .into_iter()
        .map(|g| SignificantGroup {
            mean: round_to(g.mean, 3),
            std: round_to(g.std, 3),
            t_stat: round_to(g.t_stat, 3),
            ..g
        })
        .collect())
}

fn nan_if_null(record: &Record, alias: &str) -> f64 {
    record.get(alias).and_then(Scalar::as_f64).unwrap_or(f64::NAN)
}

fn key_order(a: &Scalar, b: &Scalar) -> Ordering {
    if let (Some(x), Some(y)) = (
        a.as_str().and_then(weekday_position),
        b.as_str().and_then(weekday_position),
    ) {
        return x.cmp(&y);
    }
    a.sort_cmp(b)
}
