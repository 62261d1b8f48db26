//! In-process DuckDB engine that runs every group-by, aggregate and pivot.
//!
//! Frames are loaded into in-memory tables with positional column names
//! (`c0`, `c1`, ...) so duplicate or case-colliding labels never clash; the
//! returned [`TableSchema`] maps labels back to those identifiers.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use duckdb::types::{Value as DuckValue, ValueRef};
use duckdb::{Connection as DuckDbConnection, ToSql};
use tracing::debug;

use crate::error::{Result, VibeError};
use crate::frame::{Column, Frame, Scalar};

/// One result row keyed by column alias.
pub type Record = HashMap<String, Scalar>;

// ---------------------------------------------------------------------------
// TableSchema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    /// First-level label of the frame column.
    pub label: String,
    /// Identifier of the column inside DuckDB.
    pub ident: String,
    pub numeric: bool,
}

/// Where the columns of a registered frame live inside DuckDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<SchemaColumn>,
}

impl TableSchema {
    /// First column whose label equals `label`.
    pub fn column(&self, label: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Like [`column`](Self::column) but fails with `InvalidArgument`.
    pub fn require(&self, label: &str) -> Result<&SchemaColumn> {
        self.column(label).ok_or_else(|| {
            VibeError::InvalidArgument(format!(
                "table '{}' has no column '{}'",
                self.table, label
            ))
        })
    }

    pub fn numeric(&self) -> impl Iterator<Item = &SchemaColumn> {
        self.columns.iter().filter(|c| c.numeric)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Wraps an in-memory DuckDB connection and the frames registered in it.
pub struct Engine {
    conn: DuckDbConnection,
    tables: RefCell<HashSet<String>>,
}

impl Engine {
    /// Open a fresh in-memory database.
    pub fn open() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            tables: RefCell::new(HashSet::new()),
        })
    }

    /// Load `frame` into table `name`, replacing any previous table.
    ///
    /// Only data columns are loaded; the row index is not. Date columns are
    /// stored as ISO `VARCHAR` values.
    pub fn register_frame(&self, name: &str, frame: &Frame) -> Result<TableSchema> {
        let columns: Vec<SchemaColumn> = frame
            .columns()
            .enumerate()
            .map(|(i, (label, column))| SchemaColumn {
                label: label.name().to_string(),
                ident: format!("c{}", i),
                numeric: column.is_numeric(),
            })
            .collect();

        let defs: Vec<String> = if columns.is_empty() {
            vec!["__empty BOOLEAN".to_string()]
        } else {
            frame
                .columns()
                .zip(&columns)
                .map(|((_, column), sc)| format!("{} {}", sc.ident, sql_type(column)))
                .collect()
        };
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TABLE {} ({})",
            name,
            defs.join(", ")
        ))?;

        if !columns.is_empty() && !frame.is_empty() {
            let mut appender = self.conn.appender(name)?;
            for row in 0..frame.height() {
                let cells: Vec<DuckValue> =
                    frame.columns().map(|(_, c)| to_duck_value(c, row)).collect();
                let params: Vec<&dyn ToSql> = cells.iter().map(|c| c as &dyn ToSql).collect();
                appender.append_row(params.as_slice())?;
            }
            appender.flush()?;
        }

        self.tables.borrow_mut().insert(name.to_string());
        debug!(table = name, rows = frame.height(), cols = frame.width(), "registered frame");

        Ok(TableSchema {
            table: name.to_string(),
            columns,
        })
    }

    /// Execute SQL and return every row keyed by column alias.
    pub fn execute(&self, sql: &str, params: &[String]) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let column_names: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .ok_or_else(|| VibeError::NotFound("result metadata for query".to_string()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = HashMap::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                record.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(record);
        }

        Ok(out)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str, params: &[String]) -> Result<Option<Scalar>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        match rows.next()? {
            Some(row) => Ok(Some(convert_value_ref(row.get_ref(0)?))),
            None => Ok(None),
        }
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.borrow().contains(name)
    }

    /// Names of all registered tables, sorted.
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.borrow().iter().cloned().collect();
        names.sort();
        names
    }

    /// Drop every registered table.
    pub fn reset_tables(&self) -> Result<()> {
        let names: Vec<String> = self.tables.borrow_mut().drain().collect();
        for name in names {
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {}", name))?;
        }
        Ok(())
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

fn sql_type(column: &Column) -> &'static str {
    match column {
        Column::Float(_) => "DOUBLE",
        Column::Int(_) => "BIGINT",
        Column::Text(_) | Column::Date(_) => "VARCHAR",
    }
}

fn to_duck_value(column: &Column, row: usize) -> DuckValue {
    match column.get(row) {
        Scalar::Null => DuckValue::Null,
        Scalar::Int(n) => DuckValue::BigInt(n),
        Scalar::Float(f) => DuckValue::Double(f),
        Scalar::Text(s) => DuckValue::Text(s),
        Scalar::Date(d) => DuckValue::Text(d.format("%Y-%m-%d").to_string()),
    }
}

/// Quote a string as a SQL literal.
pub(crate) fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Convert a DuckDB `ValueRef` to a [`Scalar`].
///
/// Non-finite doubles are kept as they are.
fn convert_value_ref(val: ValueRef<'_>) -> Scalar {
    match val {
        ValueRef::Null => Scalar::Null,
        ValueRef::Boolean(b) => Scalar::Int(i64::from(b)),
        ValueRef::TinyInt(n) => Scalar::Int(i64::from(n)),
        ValueRef::SmallInt(n) => Scalar::Int(i64::from(n)),
        ValueRef::Int(n) => Scalar::Int(i64::from(n)),
        ValueRef::BigInt(n) => Scalar::Int(n),
        ValueRef::HugeInt(n) => i64::try_from(n)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(n as f64)),
        ValueRef::UTinyInt(n) => Scalar::Int(i64::from(n)),
        ValueRef::USmallInt(n) => Scalar::Int(i64::from(n)),
        ValueRef::UInt(n) => Scalar::Int(i64::from(n)),
        ValueRef::UBigInt(n) => i64::try_from(n)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(n as f64)),
        ValueRef::Float(f) => Scalar::Float(f64::from(f)),
        ValueRef::Double(f) => Scalar::Float(f),
        ValueRef::Text(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).to_string()),
        _ => Scalar::Null,
    }
}
