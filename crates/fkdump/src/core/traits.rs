//! Core traits for foreign-key aware dumps.
//!
//! - [`MetadataAccessor`]: schema metadata (FK parents, columns, primary keys)
//! - [`RowSource`]: ordered, lazily pulled rows of one table
//! - [`Dialect`]: SQL syntax strategy for the engine the script targets
//!
//! The resolver and the dumper only see these traits, so both can be tested
//! against in-memory fakes and driven by any database driver.

use futures::stream::BoxStream;

use crate::error::Result;

use super::value::Row;

/// Read-only view of one consistent schema snapshot.
///
/// Implementations must answer from the same snapshot for the whole
/// resolve + dump run.
pub trait MetadataAccessor: Send + Sync {
    /// Check if the table exists in the schema.
    fn has_table(&self, table: &str) -> bool;

    /// Tables directly referenced by `table`'s foreign keys.
    ///
    /// Deduplicated, in metadata order. May include `table` itself for
    /// self-referencing keys.
    fn parents_of(&self, table: &str) -> Result<Vec<String>>;

    /// Primary key columns in key order. Empty if the table has none.
    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>>;

    /// All columns in ordinal order.
    fn columns(&self, table: &str) -> Result<Vec<String>>;
}

/// Order in which a [`RowSource`] must return rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOrder {
    /// Ascending by the primary key columns. No two rows compare equal.
    PrimaryKey(Vec<String>),
    /// Ascending by every column in ordinal order. Rows may tie.
    AllColumns(Vec<String>),
}

impl RowOrder {
    /// Columns to order by.
    pub fn columns(&self) -> &[String] {
        match self {
            RowOrder::PrimaryKey(cols) | RowOrder::AllColumns(cols) => cols,
        }
    }

    /// Whether the order identifies each row uniquely.
    pub fn is_unique(&self) -> bool {
        matches!(self, RowOrder::PrimaryKey(_))
    }
}

/// Pull-based row retrieval.
///
/// The returned stream is finite, ordered ascending by `order`, and yields
/// values aligned with `columns`. Every row of the table is yielded exactly
/// once. Dropping the stream releases whatever cursor state backs it.
pub trait RowSource: Send + Sync {
    /// Stream all rows of `table`.
    fn fetch_rows<'a>(
        &'a self,
        table: &'a str,
        columns: Vec<String>,
        order: RowOrder,
    ) -> BoxStream<'a, Result<Row>>;
}

/// SQL syntax strategy for different database engines.
///
/// # Design Pattern
///
/// This is a **Strategy** pattern: the dump script is rendered through a
/// dialect so identifier quoting and string literal rules match the engine
/// the script is replayed into.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "mysql", "postgres").
    fn name(&self) -> &str;

    /// Validate and quote an identifier (table name, column name, etc.).
    ///
    /// - MySQL: `` `identifier` ``
    /// - PostgreSQL: `"identifier"`
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Render a string as a single-quoted literal.
    fn quote_string(&self, value: &str) -> String;

    /// Statement that switches the replaying session to UTC, matching the
    /// time zone temporal values are read in.
    fn utc_session_statement(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_order() {
        let pk = RowOrder::PrimaryKey(vec!["id".into()]);
        assert!(pk.is_unique());
        assert_eq!(pk.columns(), &["id".to_string()][..]);

        let all = RowOrder::AllColumns(vec!["at".into(), "who".into()]);
        assert!(!all.is_unique());
        assert_eq!(all.columns().len(), 2);
    }
}
