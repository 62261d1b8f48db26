//! SQL builder for the grouping queries run by the engine.
//!
//! Builder methods return `&mut Self` for chaining. Values that come from
//! callers go through `?` placeholders and the returned parameter list.
//!
//! # Example
//!
//! ```rust
//! use vibequant::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("original")
//!     .select(&["c3 AS key", "AVG(c5) AS mean"])
//!     .where_clause("c3 = ?", &["Monday"])
//!     .group_by(&["c3"])
//!     .order_by(&["c3"])
//!     .build();
//! ```

/// Builds parameterized SQL queries.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    from_table: String,
    joins: Vec<String>,
    where_clauses: Vec<String>,
    params: Vec<String>,
    group_by_cols: Vec<String>,
    order_by_cols: Vec<String>,
}

impl SqlBuilder {
    /// Create a builder selecting from a table, view or relation expression
    /// such as `range(1, 32) AS k(day)`.
    pub fn new(from: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            from_table: from.to_string(),
            joins: Vec::new(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            group_by_cols: Vec::new(),
            order_by_cols: Vec::new(),
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Append owned select expressions.
    pub fn select_more(&mut self, cols: Vec<String>) -> &mut Self {
        self.select_cols.extend(cols);
        self
    }

    /// Add a JOIN clause, e.g. `"LEFT JOIN original o ON o.c0 = k.day"`.
    pub fn join(&mut self, clause: &str) -> &mut Self {
        self.joins.push(clause.to_string());
        self
    }

    /// Add a WHERE condition with `?` placeholders for each param.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add GROUP BY columns.
    pub fn group_by(&mut self, cols: &[&str]) -> &mut Self {
        self.group_by_cols
            .extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Add ORDER BY clauses (e.g. `"k.ord"`, `"mean DESC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut parts = vec![
            format!("SELECT {}", self.select_cols.join(", ")),
            format!("FROM {}", self.from_table),
        ];

        for j in &self.joins {
            parts.push(j.clone());
        }

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.group_by_cols.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by_cols.join(", ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        (parts.join("\n"), self.params.clone())
    }
}
