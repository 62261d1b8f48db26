//! Seasonal summaries of a normalized price table.
//!
//! Every summary is a pure function of the `original` table registered in an
//! [`Engine`] and the weekday set. Single-dimension views (`W`, `D`, `M`) are
//! reindexed to their full key range with nulls for unobserved keys; pivot
//! views (`WM`, `DWM`) fill unobserved cells with `0` so heatmaps have no
//! gaps.

use std::fmt;
use std::str::FromStr;

use crate::calendar::WeekdaySet;
use crate::config::{COL_AVG_CHANGE, COL_CHANGE, COL_DAY_OF_MONTH, COL_MONTH, COL_WEEKDAY};
use crate::engine::{sql_literal, Engine, Record, TableSchema};
use crate::error::{Result, VibeError};
use crate::frame::{Column, ColumnLabel, Frame, RowIndex, Scalar};
use crate::normalize::normalize;
use crate::sql_builder::SqlBuilder;

/// Table holding the normalized observations.
pub const ORIGINAL_TABLE: &str = "original";

// ---------------------------------------------------------------------------
// ViewKind
// ---------------------------------------------------------------------------

/// Which seasonal summary is active. Parsed from the short view tags
/// `W`, `D`, `M`, `WM` and `DWM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// `W`: average change per weekday.
    Weekday,
    /// `D`: average change per day of month, 1 to 31.
    DayOfMonth,
    /// `M`: average change per month, 1 to 12.
    Month,
    /// `WM`: day of month (rows) by weekday (columns).
    DayWeekday,
    /// `DWM`: (month, day of month) rows by weekday columns.
    MonthDayWeekday,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Weekday,
        ViewKind::DayOfMonth,
        ViewKind::Month,
        ViewKind::DayWeekday,
        ViewKind::MonthDayWeekday,
    ];

    /// Parse a view tag. Tags are case-sensitive; anything else is `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "W" => Some(ViewKind::Weekday),
            "D" => Some(ViewKind::DayOfMonth),
            "M" => Some(ViewKind::Month),
            "WM" => Some(ViewKind::DayWeekday),
            "DWM" => Some(ViewKind::MonthDayWeekday),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ViewKind::Weekday => "W",
            ViewKind::DayOfMonth => "D",
            ViewKind::Month => "M",
            ViewKind::DayWeekday => "WM",
            ViewKind::MonthDayWeekday => "DWM",
        }
    }

    /// Summarize the `original` table described by `schema`.
    pub fn apply(self, engine: &Engine, schema: &TableSchema, weekdays: WeekdaySet) -> Result<Frame> {
        let obs = Observations::resolve(schema)?;
        match self {
            ViewKind::Weekday => by_weekday(engine, &obs, weekdays),
            ViewKind::DayOfMonth => by_range(engine, &obs, obs.day, 31, COL_DAY_OF_MONTH),
            ViewKind::Month => by_range(engine, &obs, obs.month, 12, COL_MONTH),
            ViewKind::DayWeekday => day_by_weekday(engine, &obs, weekdays),
            ViewKind::MonthDayWeekday => month_day_by_weekday(engine, &obs, weekdays),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ViewKind {
    type Err = VibeError;

    fn from_str(s: &str) -> Result<Self> {
        ViewKind::parse(s)
            .ok_or_else(|| VibeError::InvalidArgument(format!("unknown view tag: {}", s)))
    }
}

/// Normalize `frame` and compute one summary in a throwaway engine.
pub fn summarize(frame: &Frame, kind: ViewKind, weekdays: WeekdaySet) -> Result<Frame> {
    let normalized = normalize(frame)?;
    let engine = Engine::open()?;
    let schema = engine.register_frame(ORIGINAL_TABLE, &normalized)?;
    kind.apply(&engine, &schema, weekdays)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// DuckDB identifiers of the normalized fields.
struct Observations<'a> {
    table: &'a str,
    day: &'a str,
    weekday: &'a str,
    month: &'a str,
    change: &'a str,
}

impl<'a> Observations<'a> {
    fn resolve(schema: &'a TableSchema) -> Result<Self> {
        Ok(Self {
            table: &schema.table,
            day: ident(schema, COL_DAY_OF_MONTH)?,
            weekday: ident(schema, COL_WEEKDAY)?,
            month: ident(schema, COL_MONTH)?,
            change: ident(schema, COL_CHANGE)?,
        })
    }
}

fn ident<'a>(schema: &'a TableSchema, label: &str) -> Result<&'a str> {
    schema
        .column(label)
        .map(|c| c.ident.as_str())
        .ok_or_else(|| {
            VibeError::Schema(format!(
                "table '{}' is not normalized: missing '{}'",
                schema.table, label
            ))
        })
}

fn by_weekday(engine: &Engine, obs: &Observations<'_>, weekdays: WeekdaySet) -> Result<Frame> {
    let names = weekdays.names();
    let keys: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("({}, {})", i, sql_literal(name)))
        .collect();

    let (sql, params) = SqlBuilder::new(&format!("(VALUES {}) AS k(ord, weekday)", keys.join(", ")))
        .select(&["k.ord AS ord"])
        .select_more(vec![format!(
            "CAST(AVG(o.{}) AS DOUBLE) AS avg_change",
            obs.change
        )])
        .join(&format!(
            "LEFT JOIN {} o ON o.{} = k.weekday",
            obs.table, obs.weekday
        ))
        .group_by(&["k.ord"])
        .order_by(&["k.ord"])
        .build();

    let mut averages: Vec<Option<f64>> = vec![None; names.len()];
    for record in engine.execute(&sql, &params)? {
        if let Some(slot) = slot_of(&record, "ord", 0, names.len()) {
            averages[slot] = float(&record, "avg_change");
        }
    }

    let index = RowIndex::keys(
        COL_WEEKDAY,
        names.iter().map(|n| Scalar::Text(n.to_string())).collect(),
    );
    Frame::new(
        index,
        vec![(ColumnLabel::new(COL_AVG_CHANGE), Column::Float(averages))],
    )
}

/// Average change for every key `1..=upper` of a numeric calendar field.
fn by_range(
    engine: &Engine,
    obs: &Observations<'_>,
    key: &str,
    upper: i64,
    index_name: &str,
) -> Result<Frame> {
    let (sql, params) = SqlBuilder::new(&format!("range(1, {}) AS k(n)", upper + 1))
        .select(&["k.n AS n"])
        .select_more(vec![format!(
            "CAST(AVG(o.{}) AS DOUBLE) AS avg_change",
            obs.change
        )])
        .join(&format!("LEFT JOIN {} o ON o.{} = k.n", obs.table, key))
        .group_by(&["k.n"])
        .order_by(&["k.n"])
        .build();

    let size = upper as usize;
    let mut averages: Vec<Option<f64>> = vec![None; size];
    for record in engine.execute(&sql, &params)? {
        if let Some(slot) = slot_of(&record, "n", 1, size) {
            averages[slot] = float(&record, "avg_change");
        }
    }

    let index = RowIndex::keys(index_name, (1..=upper).map(Scalar::Int).collect());
    Frame::new(
        index,
        vec![(ColumnLabel::new(COL_AVG_CHANGE), Column::Float(averages))],
    )
}

fn day_by_weekday(engine: &Engine, obs: &Observations<'_>, weekdays: WeekdaySet) -> Result<Frame> {
    let (sql, params) = SqlBuilder::new("range(1, 32) AS k(n)")
        .select(&["k.n AS n"])
        .select_more(pivot_exprs(obs, weekdays))
        .join(&format!("LEFT JOIN {} o ON o.{} = k.n", obs.table, obs.day))
        .group_by(&["k.n"])
        .order_by(&["k.n"])
        .build();

    let names = weekdays.names();
    let mut cells: Vec<Vec<Option<f64>>> = vec![vec![Some(0.0); 31]; names.len()];
    for record in engine.execute(&sql, &params)? {
        if let Some(slot) = slot_of(&record, "n", 1, 31) {
            for (w, column) in cells.iter_mut().enumerate() {
                column[slot] = Some(pivot_cell(&record, w));
            }
        }
    }

    let index = RowIndex::keys(COL_DAY_OF_MONTH, (1..=31).map(Scalar::Int).collect());
    Frame::new(index, weekday_columns(names, cells))
}

/// Pivot over the observed `(month, day)` pairs, ascending.
fn month_day_by_weekday(
    engine: &Engine,
    obs: &Observations<'_>,
    weekdays: WeekdaySet,
) -> Result<Frame> {
    let month = format!("o.{}", obs.month);
    let day = format!("o.{}", obs.day);
    let (sql, params) = SqlBuilder::new(&format!("{} o", obs.table))
        .select(&[])
        .select_more(vec![
            format!("CAST({} AS BIGINT) AS m", month),
            format!("CAST({} AS BIGINT) AS d", day),
        ])
        .select_more(pivot_exprs(obs, weekdays))
        .where_clause(&format!("{} IS NOT NULL AND {} IS NOT NULL", month, day), &[])
        .group_by(&[month.as_str(), day.as_str()])
        .order_by(&[month.as_str(), day.as_str()])
        .build();

    let names = weekdays.names();
    let mut keys: Vec<Vec<Scalar>> = Vec::new();
    let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    for record in engine.execute(&sql, &params)? {
        let (Some(m), Some(d)) = (
            record.get("m").and_then(Scalar::as_i64),
            record.get("d").and_then(Scalar::as_i64),
        ) else {
            continue;
        };
        keys.push(vec![Scalar::Int(m), Scalar::Int(d)]);
        for (w, column) in cells.iter_mut().enumerate() {
            column.push(Some(pivot_cell(&record, w)));
        }
    }

    let index = RowIndex::Keys {
        names: vec![COL_MONTH.to_string(), COL_DAY_OF_MONTH.to_string()],
        rows: keys,
    };
    Frame::new(index, weekday_columns(names, cells))
}

/// One zero-filled `AVG ... FILTER` expression per weekday, aliased `w0..`.
fn pivot_exprs(obs: &Observations<'_>, weekdays: WeekdaySet) -> Vec<String> {
    weekdays
        .names()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                "CAST(COALESCE(AVG(o.{}) FILTER (WHERE o.{} = {}), 0) AS DOUBLE) AS w{}",
                obs.change,
                obs.weekday,
                sql_literal(name),
                i
            )
        })
        .collect()
}

fn pivot_cell(record: &Record, weekday: usize) -> f64 {
    float(record, &format!("w{}", weekday)).unwrap_or(0.0)
}

fn weekday_columns(
    names: &[&str],
    cells: Vec<Vec<Option<f64>>>,
) -> Vec<(ColumnLabel, Column)> {
    names
        .iter()
        .zip(cells)
        .map(|(name, values)| (ColumnLabel::new(name), Column::Float(values)))
        .collect()
}

fn float(record: &Record, alias: &str) -> Option<f64> {
    record.get(alias).and_then(Scalar::as_f64)
}

/// Zero-based slot of an integer key column, if it falls in range.
fn slot_of(record: &Record, alias: &str, first: i64, len: usize) -> Option<usize> {
    let key = record.get(alias).and_then(Scalar::as_i64)?;
    let slot = usize::try_from(key - first).ok()?;
    (slot < len).then_some(slot)
}
