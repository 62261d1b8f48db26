//! Time-feature normalization of raw price tables.
//!
//! Guarantees the calendar fields (`DayOfMonth`, `Weekday`, `Month`) and the
//! percentage change (`Change`) that every seasonal summary groups on.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::calendar::weekday_name;
use crate::config::{
    COL_CHANGE, COL_CLOSE, COL_DAY_OF_MONTH, COL_MONTH, COL_OPEN, COL_WEEKDAY, DATE_COLUMN_NAMES,
};
use crate::error::{Result, VibeError};
use crate::frame::{Column, ColumnLabel, Frame, RowIndex};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Return a copy of `frame` with calendar and change fields guaranteed.
///
/// Two-level column labels are collapsed to their first level first. Fields
/// that are already present and fully populated are kept as they are, so
/// normalizing twice yields the same table.
///
/// # Errors
///
/// [`VibeError::Schema`] when a calendar field is missing and the frame has
/// neither a date index nor a date-like column, when a date cell cannot be
/// parsed, or when `Change` is missing and `Open`/`Close` are not both
/// present, or a row has a null price or a zero `Open`. A frame without rows
/// never fails: missing fields are added as empty columns.
pub fn normalize(frame: &Frame) -> Result<Frame> {
    let mut out = frame.clone().collapse_labels();

    if out.is_empty() {
        return add_empty_fields(out);
    }

    let calendar_missing = [COL_DAY_OF_MONTH, COL_WEEKDAY, COL_MONTH]
        .iter()
        .any(|name| !has_field(&out, name));

    if calendar_missing {
        let dates = resolve_dates(&mut out)?;
        if !has_field(&out, COL_DAY_OF_MONTH) {
            let days = dates.iter().map(|d| Some(i64::from(d.day()))).collect();
            out = out.with_column(COL_DAY_OF_MONTH.into(), Column::Int(days))?;
        }
        if !has_field(&out, COL_WEEKDAY) {
            let names = dates
                .iter()
                .map(|d| Some(weekday_name(*d).to_string()))
                .collect();
            out = out.with_column(COL_WEEKDAY.into(), Column::Text(names))?;
        }
        if !has_field(&out, COL_MONTH) {
            let months = dates.iter().map(|d| Some(i64::from(d.month()))).collect();
            out = out.with_column(COL_MONTH.into(), Column::Int(months))?;
        }
    }

    if !has_field(&out, COL_CHANGE) {
        let change = derive_change(&out)?;
        out = out.with_column(COL_CHANGE.into(), Column::Float(change))?;
    }

    Ok(out)
}

/// A derived field counts as present when it exists with the expected type
/// and has no missing cells.
fn has_field(frame: &Frame, name: &str) -> bool {
    let Some(column) = frame.column(name) else {
        return false;
    };
    let typed = match name {
        COL_WEEKDAY => matches!(column, Column::Text(_)),
        _ => column.is_numeric(),
    };
    typed && column.null_count() == 0
}

fn add_empty_fields(mut frame: Frame) -> Result<Frame> {
    let fields = [
        (COL_DAY_OF_MONTH, Column::Int(Vec::new())),
        (COL_WEEKDAY, Column::Text(Vec::new())),
        (COL_MONTH, Column::Int(Vec::new())),
        (COL_CHANGE, Column::Float(Vec::new())),
    ];
    for (name, column) in fields {
        if !has_field(&frame, name) {
            frame = frame.with_column(ColumnLabel::new(name), column)?;
        }
    }
    Ok(frame)
}

/// Resolve one date per row.
///
/// A date index wins. Otherwise the first column named `date`, `datetime`,
/// `timestamp` or `time` (any case) is parsed and replaced in place by a
/// date column.
fn resolve_dates(frame: &mut Frame) -> Result<Vec<NaiveDate>> {
    if let RowIndex::Dates { values, .. } = frame.index() {
        return Ok(values.clone());
    }

    let Some(position) = frame.position_ci(&DATE_COLUMN_NAMES) else {
        return Err(VibeError::Schema(format!(
            "no date index or date-like column ({}) to derive calendar fields from",
            DATE_COLUMN_NAMES.join(", ")
        )));
    };

    let (label, column) = frame
        .column_at(position)
        .ok_or_else(|| VibeError::Schema(format!("no column at position {}", position)))?;
    let dates = parse_date_column(&label.to_string(), column)?;
    frame.replace_column_at(position, Column::Date(dates.iter().copied().map(Some).collect()))?;
    Ok(dates)
}

fn parse_date_column(name: &str, column: &Column) -> Result<Vec<NaiveDate>> {
    let missing = |row: usize| VibeError::Schema(format!("column '{}' has no date in row {}", name, row));
    match column {
        Column::Date(cells) => cells
            .iter()
            .enumerate()
            .map(|(row, d)| (*d).ok_or_else(|| missing(row)))
            .collect(),
        Column::Text(cells) => cells
            .iter()
            .enumerate()
            .map(|(row, s)| {
                let s = s.as_deref().ok_or_else(|| missing(row))?;
                parse_date(s).ok_or_else(|| {
                    VibeError::Schema(format!(
                        "column '{}' row {}: cannot parse '{}' as a date",
                        name, row, s
                    ))
                })
            })
            .collect(),
        Column::Int(cells) => cells
            .iter()
            .enumerate()
            .map(|(row, secs)| {
                let secs = (*secs).ok_or_else(|| missing(row))?;
                DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| {
                        VibeError::Schema(format!(
                            "column '{}' row {}: epoch {} out of range",
                            name, row, secs
                        ))
                    })
            })
            .collect(),
        Column::Float(_) => Err(VibeError::Schema(format!(
            "column '{}' holds floats, not dates",
            name
        ))),
    }
}

/// Parse a date from an ISO-like string, dropping any time of day.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// `(close - open) / open * 100` for every row.
///
/// A row with a missing price or a zero open has no defined change and fails
/// the whole table with `Schema`.
fn derive_change(frame: &Frame) -> Result<Vec<Option<f64>>> {
    let open = price_column(frame, COL_OPEN)?;
    let close = price_column(frame, COL_CLOSE)?;

    (0..frame.height())
        .map(|row| match (open.f64_at(row), close.f64_at(row)) {
            (Some(o), Some(c)) if o != 0.0 => Ok(Some((c - o) / o * 100.0)),
            (Some(_), Some(_)) => Err(VibeError::Schema(format!(
                "cannot derive {} in row {}: {} is zero",
                COL_CHANGE, row, COL_OPEN
            ))),
            _ => Err(VibeError::Schema(format!(
                "cannot derive {} in row {}: {} or {} is missing",
                COL_CHANGE, row, COL_OPEN, COL_CLOSE
            ))),
        })
        .collect()
}

fn price_column<'a>(frame: &'a Frame, name: &str) -> Result<&'a Column> {
    let position = frame.position_ci(&[name]).ok_or_else(|| {
        VibeError::Schema(format!(
            "cannot derive {}: column '{}' is missing",
            COL_CHANGE, name
        ))
    })?;
    let (_, column) = frame
        .column_at(position)
        .ok_or_else(|| VibeError::Schema(format!("no column at position {}", position)))?;
    if !column.is_numeric() {
        return Err(VibeError::Schema(format!(
            "cannot derive {}: column '{}' is {}, not numeric",
            COL_CHANGE,
            name,
            column.dtype()
        )));
    }
    Ok(column)
}
