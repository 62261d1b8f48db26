//! In-memory table: a row index plus ordered, labelled, typed columns.
//!
//! A [`Frame`] is the unit every other module passes around: price sources
//! return one, the normalizer derives calendar fields on one, and every
//! seasonal summary is one. Frames are plain owned values; cloning is the
//! only way to share them.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config;
use crate::error::{Result, VibeError};

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the value; `None` for nulls, text and dates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value. Floats convert only when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Total order used for sorting keys: numbers, then dates, then text,
    /// with nulls last.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        fn rank(s: &Scalar) -> u8 {
            match s {
                Scalar::Int(_) | Scalar::Float(_) => 0,
                Scalar::Date(_) => 1,
                Scalar::Text(_) => 2,
                Scalar::Null => 3,
            }
        }
        match (self, other) {
            (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => rank(self).cmp(&rank(other)),
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NaN"),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(v) => write!(f, "{}", format_float(*v)),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Render a float with at least one and at most six decimals.
fn format_float(v: f64) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "NaN".to_string()
        } else if v > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let s = format!("{:.6}", v);
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A typed column of nullable cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Float and integer columns are numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Float(_) | Column::Int(_))
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            Column::Float(_) => "float64",
            Column::Int(_) => "int64",
            Column::Text(_) => "text",
            Column::Date(_) => "date",
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Float(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Int(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Date(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Cell at `row`, or [`Scalar::Null`] when out of range or missing.
    pub fn get(&self, row: usize) -> Scalar {
        match self {
            Column::Float(v) => v.get(row).copied().flatten().map_or(Scalar::Null, Scalar::Float),
            Column::Int(v) => v.get(row).copied().flatten().map_or(Scalar::Null, Scalar::Int),
            Column::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Scalar::Null, Scalar::Text),
            Column::Date(v) => v.get(row).copied().flatten().map_or(Scalar::Null, Scalar::Date),
        }
    }

    /// Numeric cell at `row`; `None` for non-numeric columns.
    pub fn f64_at(&self, row: usize) -> Option<f64> {
        match self {
            Column::Float(v) => v.get(row).copied().flatten(),
            Column::Int(v) => v.get(row).copied().flatten().map(|n| n as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnLabel
// ---------------------------------------------------------------------------

/// Column label with one or more levels.
///
/// Single-level labels are the norm. Tables combining several sources (for
/// example one column per `(field, ticker)` pair) carry two levels; the first
/// level is the field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnLabel(Vec<String>);

impl ColumnLabel {
    pub fn new(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    /// Build a multi-level label. An empty slice yields an empty name.
    pub fn multi(levels: &[&str]) -> Self {
        if levels.is_empty() {
            return Self(vec![String::new()]);
        }
        Self(levels.iter().map(|l| l.to_string()).collect())
    }

    /// First level of the label.
    pub fn name(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    pub fn is_multi(&self) -> bool {
        self.0.len() > 1
    }

    /// The label reduced to its first level.
    pub fn first_level(&self) -> Self {
        Self(vec![self.name().to_string()])
    }
}

impl From<&str> for ColumnLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ColumnLabel {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

// ---------------------------------------------------------------------------
// RowIndex
// ---------------------------------------------------------------------------

/// Row labels of a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowIndex {
    /// Unlabelled rows `0..n`.
    Positional(usize),
    /// A date-typed index, as returned by price sources.
    Dates {
        name: Option<String>,
        values: Vec<NaiveDate>,
    },
    /// One or more named key levels, as produced by summaries.
    Keys {
        names: Vec<String>,
        rows: Vec<Vec<Scalar>>,
    },
}

impl RowIndex {
    pub fn len(&self) -> usize {
        match self {
            RowIndex::Positional(n) => *n,
            RowIndex::Dates { values, .. } => values.len(),
            RowIndex::Keys { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the index levels. A positional index has none.
    pub fn level_names(&self) -> Vec<String> {
        match self {
            RowIndex::Positional(_) => Vec::new(),
            RowIndex::Dates { name, .. } => {
                vec![name.clone().unwrap_or_else(|| "Date".to_string())]
            }
            RowIndex::Keys { names, .. } => names.clone(),
        }
    }

    /// Key values of one row (empty for a positional index).
    pub fn key(&self, row: usize) -> Vec<Scalar> {
        match self {
            RowIndex::Positional(_) => Vec::new(),
            RowIndex::Dates { values, .. } => values
                .get(row)
                .map(|d| vec![Scalar::Date(*d)])
                .unwrap_or_default(),
            RowIndex::Keys { rows, .. } => rows.get(row).cloned().unwrap_or_default(),
        }
    }

    /// Single-level key index.
    pub fn keys(name: &str, values: Vec<Scalar>) -> Self {
        RowIndex::Keys {
            names: vec![name.to_string()],
            rows: values.into_iter().map(|v| vec![v]).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A time-indexed or key-indexed table of typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: RowIndex,
    labels: Vec<ColumnLabel>,
    columns: Vec<Column>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

impl Frame {
    /// A frame with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            index: RowIndex::Positional(0),
            labels: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Build a frame, checking every column against the index length.
    pub fn new(index: RowIndex, columns: Vec<(ColumnLabel, Column)>) -> Result<Self> {
        let height = index.len();
        if let RowIndex::Keys { names, rows } = &index {
            if let Some(bad) = rows.iter().position(|r| r.len() != names.len()) {
                return Err(VibeError::InvalidArgument(format!(
                    "index row {} has {} levels, expected {}",
                    bad,
                    rows[bad].len(),
                    names.len()
                )));
            }
        }
        let mut labels = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        for (label, column) in columns {
            if column.len() != height {
                return Err(VibeError::InvalidArgument(format!(
                    "column '{}' has {} rows, index has {}",
                    label,
                    column.len(),
                    height
                )));
            }
            labels.push(label);
            cols.push(column);
        }
        Ok(Self {
            index,
            labels,
            columns: cols,
        })
    }

    /// Build a positionally indexed frame from columns of equal length.
    pub fn from_columns(columns: Vec<(ColumnLabel, Column)>) -> Result<Self> {
        let height = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        Self::new(RowIndex::Positional(height), columns)
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// True when the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn labels(&self) -> &[ColumnLabel] {
        &self.labels
    }

    pub fn columns(&self) -> impl Iterator<Item = (&ColumnLabel, &Column)> {
        self.labels.iter().zip(self.columns.iter())
    }

    pub fn column_at(&self, position: usize) -> Option<(&ColumnLabel, &Column)> {
        self.labels.get(position).zip(self.columns.get(position))
    }

    /// First column whose (first-level) name equals `name`.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|l| l.name() == name)
    }

    /// First column, in column order, whose name case-insensitively equals
    /// one of `candidates`.
    pub fn position_ci(&self, candidates: &[&str]) -> Option<usize> {
        self.labels.iter().position(|l| {
            let name = l.name().to_lowercase();
            candidates.iter().any(|c| c.to_lowercase() == name)
        })
    }

    /// Numeric columns in column order.
    pub fn numeric_columns(&self) -> Vec<(&ColumnLabel, &Column)> {
        self.columns().filter(|(_, c)| c.is_numeric()).collect()
    }

    /// Insert a column, replacing an existing column with the same label.
    pub fn with_column(mut self, label: ColumnLabel, column: Column) -> Result<Self> {
        if column.len() != self.height() {
            return Err(VibeError::InvalidArgument(format!(
                "column '{}' has {} rows, frame has {}",
                label,
                column.len(),
                self.height()
            )));
        }
        match self.labels.iter().position(|l| *l == label) {
            Some(i) => self.columns[i] = column,
            None => {
                self.labels.push(label);
                self.columns.push(column);
            }
        }
        Ok(self)
    }

    /// Replace the column at `position`, keeping its label.
    pub(crate) fn replace_column_at(&mut self, position: usize, column: Column) -> Result<()> {
        if column.len() != self.height() {
            return Err(VibeError::InvalidArgument(format!(
                "replacement column has {} rows, frame has {}",
                column.len(),
                self.height()
            )));
        }
        match self.columns.get_mut(position) {
            Some(slot) => {
                *slot = column;
                Ok(())
            }
            None => Err(VibeError::InvalidArgument(format!(
                "no column at position {}",
                position
            ))),
        }
    }

    /// Collapse multi-level labels to their first level.
    pub fn collapse_labels(mut self) -> Self {
        for label in &mut self.labels {
            if label.is_multi() {
                *label = label.first_level();
            }
        }
        self
    }

    /// Render the frame as a bordered text table showing at most `size` rows.
    ///
    /// Index levels are printed as leading columns. Headers are centered and
    /// values right-aligned; truncated tables end with a `...` row.
    pub fn table(&self, size: usize) -> String {
        let mut headers: Vec<String> = self.index.level_names();
        headers.extend(self.labels.iter().map(|l| l.to_string()));
        if headers.is_empty() {
            return String::new();
        }

        let shown = self.height().min(size);
        let rows: Vec<Vec<String>> = (0..shown)
            .map(|r| {
                let mut cells: Vec<String> =
                    self.index.key(r).iter().map(|k| k.to_string()).collect();
                cells.extend(self.columns.iter().map(|c| c.get(r).to_string()));
                cells
            })
            .collect();

        let max_header = headers.iter().map(|h| h.chars().count()).max().unwrap_or(0);
        let sizes: Vec<usize> = (0..headers.len())
            .map(|i| {
                let widest = rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .max()
                    .unwrap_or(0);
                2 + widest.max(max_header)
            })
            .collect();

        let hline = format!(
            "+{}+",
            sizes
                .iter()
                .map(|s| "-".repeat(*s))
                .collect::<Vec<_>>()
                .join("+")
        );
        let build = |cells: &[String], align: fn(&str, usize) -> String| -> String {
            format!(
                "|{}|",
                cells
                    .iter()
                    .zip(&sizes)
                    .map(|(c, s)| align(c, *s))
                    .collect::<Vec<_>>()
                    .join("|")
            )
        };

        let mut out = vec![hline.clone(), build(&headers, align_center), hline.clone()];
        for row in &rows {
            out.push(build(row, align_right));
        }
        if self.height() > size {
            let inner = sizes.iter().sum::<usize>() + sizes.len() - 1;
            let pad = inner.saturating_sub(3);
            let left = pad / 2;
            out.push(format!(
                "|{}...{}|",
                " ".repeat(left),
                " ".repeat(pad - left)
            ));
        }
        out.push(hline);
        out.join("\n")
    }
}

fn align_center(s: &str, size: usize) -> String {
    let len = s.chars().count();
    if len >= size {
        return s.to_string();
    }
    let pad = " ".repeat(1 + (size - len) / 2);
    format!("{}{}{}", pad, s, pad).chars().take(size).collect()
}

fn align_right(s: &str, size: usize) -> String {
    let len = s.chars().count();
    if len >= size {
        return s.to_string();
    }
    format!("{}{} ", " ".repeat(size - len - 1), s)
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table(config::DEFAULT_TABLE_ROWS))
    }
}
