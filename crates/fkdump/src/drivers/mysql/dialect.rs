//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! Provides MySQL-specific identifier quoting and string literals for the
//! dump script, and the SELECT statements the reader pages rows with.

use crate::core::identifier::{quote_list, quote_mysql};
use crate::core::traits::Dialect;
use crate::error::Result;

/// MySQL/MariaDB dialect implementation.
///
/// Compatible with MySQL 5.7+, 8.0+, and MariaDB 10.2+.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// Build a SELECT query for reading rows.
    ///
    /// With `keyset` set the query continues a keyset scan: only rows whose
    /// `order_by` columns compare greater than the bound parameters (one
    /// `?` per order column) are selected.
    pub fn build_select_query(&self, opts: &SelectQueryOptions) -> Result<String> {
        let cols = if opts.columns.is_empty() {
            "*".to_string()
        } else {
            quote_list(&opts.columns, quote_mysql)?
        };

        let table = match opts.schema {
            Some(ref schema) => format!("{}.{}", quote_mysql(schema)?, quote_mysql(&opts.table)?),
            None => quote_mysql(&opts.table)?,
        };

        let mut sql = format!("SELECT {} FROM {}", cols, table);

        if opts.keyset && !opts.order_by.is_empty() {
            let key_cols = quote_list(&opts.order_by, quote_mysql)?;
            let params = vec!["?"; opts.order_by.len()].join(", ");
            if opts.order_by.len() == 1 {
                sql.push_str(&format!(" WHERE {} > {}", key_cols, params));
            } else {
                sql.push_str(&format!(" WHERE ({}) > ({})", key_cols, params));
            }
        }

        if !opts.order_by.is_empty() {
            sql.push_str(&format!(
                " ORDER BY {}",
                quote_list(&opts.order_by, quote_mysql)?
            ));
        }

        // MySQL only accepts OFFSET together with LIMIT
        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = opts.offset.filter(|o| *o > 0) {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        Ok(sql)
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_mysql(name)
    }

    fn quote_string(&self, value: &str) -> String {
        // Backslash is an escape character in MySQL string literals unless
        // NO_BACKSLASH_ESCAPES is set. The mysql client rejects a raw NUL
        // outside --binary-mode.
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for ch in value.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                '\0' => out.push_str("\\0"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
        out
    }

    fn utc_session_statement(&self) -> &'static str {
        "SET time_zone = '+00:00';"
    }
}

/// Options for building a SELECT query.
#[derive(Debug, Clone, Default)]
pub struct SelectQueryOptions {
    /// Schema (database) name, if the table should be qualified.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Columns to select; empty selects `*`.
    pub columns: Vec<String>,
    /// Columns to order by, ascending.
    pub order_by: Vec<String>,
    /// Select only rows after a key bound as parameters, aligned with `order_by`.
    pub keyset: bool,
    /// Row limit (page size).
    pub limit: Option<usize>,
    /// Rows to skip before the page starts.
    pub offset: Option<u64>,
}

impl SelectQueryOptions {
    /// Create options selecting `columns` from `table`.
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            ..Self::default()
        }
    }

    /// Qualify the table with a schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Order by the given columns.
    pub fn with_order_by(mut self, order_by: Vec<String>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Continue after a key that is bound when the query runs.
    pub fn with_keyset(mut self, keyset: bool) -> Self {
        self.keyset = keyset;
        self
    }

    /// Restrict to one page of `limit` rows starting at `offset`.
    pub fn with_page(mut self, limit: usize, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}
