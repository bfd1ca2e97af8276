//! Batched INSERT generation.
//!
//! [`TableDumper`] pulls a table's rows from a [`RowSource`] in primary key
//! order and renders them as multi-row `INSERT` statements of at most
//! `batch_size` tuples each. Rows are grouped lazily, so at most one batch
//! is held in memory at a time.
//!
//! [`ScriptWriter`] assembles the per-table statements into the dump script.

mod script;

pub use script::{ScriptWriter, TableSummary};

use std::fmt;

use futures::stream::{BoxStream, StreamExt, TryChunksError, TryStreamExt};
use tracing::{debug, warn};

use crate::core::traits::{Dialect, MetadataAccessor, RowOrder, RowSource};
use crate::core::value::{Row, SqlValue};
use crate::drivers::DialectImpl;
use crate::error::{DumpError, Result};

/// Default number of rows per INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// One multi-row INSERT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// Statement text, terminated by `;` and a newline.
    pub sql: String,
    /// Number of tuples in the statement.
    pub rows: usize,
}

impl InsertStatement {
    /// Statement text.
    pub fn as_str(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Renders the rows of one table as batched INSERT statements.
#[derive(Debug, Clone)]
pub struct TableDumper {
    dialect: DialectImpl,
    batch_size: usize,
}

impl Default for TableDumper {
    fn default() -> Self {
        Self::new(DialectImpl::default())
    }
}

impl TableDumper {
    /// Create a dumper for the given output dialect.
    pub fn new(dialect: DialectImpl) -> Self {
        Self {
            dialect,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the maximum number of tuples per INSERT (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Maximum number of tuples per INSERT.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Output dialect.
    pub fn dialect(&self) -> &DialectImpl {
        &self.dialect
    }

    /// Stream the INSERT statements for `table`.
    ///
    /// Metadata errors (`NotFound`, invalid identifiers) are returned before
    /// any row is fetched. Errors raised while rows are pulled are yielded by
    /// the stream; statements already yielded for the table must then be
    /// discarded. A table with no rows yields no statements.
    pub fn dump<'a, M, S>(
        &'a self,
        table: &'a str,
        metadata: &M,
        source: &'a S,
    ) -> Result<BoxStream<'a, Result<InsertStatement>>>
    where
        M: MetadataAccessor + ?Sized,
        S: RowSource + ?Sized,
    {
        let columns = metadata.columns(table)?;
        if columns.is_empty() {
            return Err(DumpError::source_failure(table, "table has no columns"));
        }
        let order = fetch_order(metadata, table, &columns)?;
        let prefix = self.insert_prefix(table, &columns)?;

        let batch_size = self.batch_size;
        let dialect = &self.dialect;

        debug!(
            "{}: dumping {} columns ordered by [{}]",
            table,
            columns.len(),
            order.columns().join(", ")
        );

        let statements = source
            .fetch_rows(table, columns.clone(), order)
            .try_chunks(batch_size)
            .map_err(|TryChunksError(_, e)| e)
            .enumerate()
            .map(move |(index, chunk)| -> Result<InsertStatement> {
                let rows = chunk?;
                let first_row = (index * batch_size) as u64;
                let sql = render_insert(dialect, table, &columns, &prefix, &rows, first_row)?;
                debug!("{}: batch {} with {} rows", table, index + 1, rows.len());
                Ok(InsertStatement {
                    sql,
                    rows: rows.len(),
                })
            });

        Ok(statements.boxed())
    }

    /// `INSERT INTO t (a, b) VALUES\n` with quoted identifiers.
    fn insert_prefix(&self, table: &str, columns: &[String]) -> Result<String> {
        let column_list = columns
            .iter()
            .map(|c| self.dialect.quote_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES\n",
            self.dialect.quote_ident(table)?,
            column_list
        ))
    }
}

/// Columns that define the order rows are fetched and emitted in.
///
/// The primary key when the table has one. Tables without a primary key are
/// ordered by all of their columns in ordinal order; rows equal in every
/// column are indistinguishable, so this order is deterministic for the
/// output.
pub fn fetch_order<M>(metadata: &M, table: &str, columns: &[String]) -> Result<RowOrder>
where
    M: MetadataAccessor + ?Sized,
{
    let pk = metadata.primary_key_columns(table)?;
    if pk.is_empty() {
        warn!("{}: no primary key, ordering rows by all columns", table);
        Ok(RowOrder::AllColumns(columns.to_vec()))
    } else {
        Ok(RowOrder::PrimaryKey(pk))
    }
}

/// Render a single value as a SQL literal.
///
/// NULL, numbers and text have literal forms. For anything else the value's
/// type name is returned as the error so the caller can report where it was
/// found.
pub fn sql_escape<D>(dialect: &D, value: &SqlValue<'_>) -> std::result::Result<String, &'static str>
where
    D: Dialect + ?Sized,
{
    match value {
        SqlValue::Null => Ok("NULL".to_string()),
        SqlValue::Int(v) => Ok(v.to_string()),
        SqlValue::UInt(v) => Ok(v.to_string()),
        SqlValue::Float(v) if v.is_finite() => Ok(v.to_string()),
        SqlValue::Float(_) => Err("non-finite float"),
        SqlValue::Decimal(v) => Ok(v.to_string()),
        SqlValue::Text(s) => Ok(dialect.quote_string(s)),
        SqlValue::Bytes(_) => Err(value.type_name()),
    }
}

/// Render one batch of rows. `first_row` is the table offset of `rows[0]`.
fn render_insert(
    dialect: &DialectImpl,
    table: &str,
    columns: &[String],
    prefix: &str,
    rows: &[Row],
    first_row: u64,
) -> Result<String> {
    let mut sql = String::with_capacity(prefix.len() + rows.len() * 16 * columns.len());
    sql.push_str(prefix);

    for (i, row) in rows.iter().enumerate() {
        let offset = first_row + i as u64;
        if row.len() != columns.len() {
            return Err(DumpError::source_failure(
                table,
                format!(
                    "row {} has {} values, expected {}",
                    offset,
                    row.len(),
                    columns.len()
                ),
            ));
        }

        if i > 0 {
            sql.push_str(",\n");
        }
        sql.push('(');
        for (j, (value, column)) in row.iter().zip(columns).enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            let literal = sql_escape(dialect, value).map_err(|type_name| {
                DumpError::UnsupportedType {
                    table: table.to_string(),
                    column: column.clone(),
                    row: offset,
                    type_name,
                }
            })?;
            sql.push_str(&literal);
        }
        sql.push(')');
    }

    sql.push_str(";\n");
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SchemaSnapshot, Table};
    use crate::drivers::PostgresDialect;
    use futures::stream;
    use rust_decimal::Decimal;
    use std::borrow::Cow;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    /// Row source serving fixed rows per table and recording each request.
    #[derive(Default)]
    struct MemorySource {
        rows: HashMap<String, Vec<Row>>,
        fail_after: Option<usize>,
        requests: Mutex<Vec<(String, Vec<String>, RowOrder)>>,
    }

    impl MemorySource {
        fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
            self.rows.insert(table.to_string(), rows);
            self
        }
    }

    impl RowSource for MemorySource {
        fn fetch_rows<'a>(
            &'a self,
            table: &'a str,
            columns: Vec<String>,
            order: RowOrder,
        ) -> BoxStream<'a, Result<Row>> {
            self.requests
                .lock()
                .unwrap()
                .push((table.to_string(), columns, order));
            let rows = self.rows.get(table).cloned().unwrap_or_default();
            let fail_after = self.fail_after;
            let items: Vec<Result<Row>> = rows
                .into_iter()
                .enumerate()
                .map(|(i, row)| match fail_after {
                    Some(n) if i >= n => Err(DumpError::source_failure(table, "connection reset")),
                    _ => Ok(row),
                })
                .collect();
            stream::iter(items).boxed()
        }
    }

    fn people_snapshot() -> SchemaSnapshot {
        SchemaSnapshot::from_tables([Table::new("shop", "people")
            .with_columns(&["id", "name"])
            .with_primary_key(&["id"])])
    }

    fn people(n: usize) -> Vec<Row> {
        (1..=n)
            .map(|i| vec![SqlValue::Int(i as i64), SqlValue::from(format!("p{}", i))])
            .collect()
    }

    async fn collect(
        dumper: &TableDumper,
        table: &str,
        meta: &SchemaSnapshot,
        source: &MemorySource,
    ) -> Result<Vec<InsertStatement>> {
        dumper.dump(table, meta, source)?.try_collect().await
    }

    fn tuple_count(sql: &str) -> usize {
        sql.lines().filter(|l| l.starts_with('(')).count()
    }

    #[test]
    fn test_sql_escape_literals() {
        let d = DialectImpl::default();
        assert_eq!(sql_escape(&d, &SqlValue::Null).unwrap(), "NULL");
        assert_eq!(sql_escape(&d, &SqlValue::Int(42)).unwrap(), "42");
        assert_eq!(sql_escape(&d, &SqlValue::Int(-7)).unwrap(), "-7");
        assert_eq!(sql_escape(&d, &SqlValue::UInt(u64::MAX)).unwrap(), "18446744073709551615");
        assert_eq!(sql_escape(&d, &SqlValue::Float(3.5)).unwrap(), "3.5");
        assert_eq!(
            sql_escape(&d, &SqlValue::Decimal(Decimal::from_str("12.50").unwrap())).unwrap(),
            "12.50"
        );
        assert_eq!(sql_escape(&d, &SqlValue::from("O'Brien")).unwrap(), "'O''Brien'");
        assert_eq!(sql_escape(&d, &SqlValue::from("")).unwrap(), "''");
    }

    #[test]
    fn test_sql_escape_backslash_depends_on_dialect() {
        let value = SqlValue::from("C:\\tmp");
        let mysql = DialectImpl::default();
        let pg = DialectImpl::Postgres(PostgresDialect::new());
        assert_eq!(sql_escape(&mysql, &value).unwrap(), "'C:\\\\tmp'");
        assert_eq!(sql_escape(&pg, &value).unwrap(), "'C:\\tmp'");
    }

    #[test]
    fn test_sql_escape_rejects_unencodable() {
        let d = DialectImpl::default();
        assert_eq!(sql_escape(&d, &SqlValue::Bytes(Cow::Borrowed(&[1u8, 2][..]))), Err("bytes"));
        assert_eq!(sql_escape(&d, &SqlValue::Float(f64::NAN)), Err("non-finite float"));
        assert_eq!(sql_escape(&d, &SqlValue::Float(f64::INFINITY)), Err("non-finite float"));
    }

    #[tokio::test]
    async fn test_batches_of_1000() {
        let meta = people_snapshot();
        let source = MemorySource::default().with_rows("people", people(2500));
        let dumper = TableDumper::default();

        let statements = collect(&dumper, "people", &meta, &source).await.unwrap();
        let sizes: Vec<usize> = statements.iter().map(|s| s.rows).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        for stmt in &statements {
            assert_eq!(tuple_count(&stmt.sql), stmt.rows);
            assert!(stmt.sql.starts_with("INSERT INTO `people` (`id`, `name`) VALUES\n"));
            assert!(stmt.sql.ends_with(");\n"));
        }
    }

    #[tokio::test]
    async fn test_statement_format() {
        let meta = SchemaSnapshot::from_tables([Table::new("shop", "t")
            .with_columns(&["a", "b", "c"])
            .with_primary_key(&["a"])]);
        let source = MemorySource::default().with_rows(
            "t",
            vec![
                vec![SqlValue::Int(1), SqlValue::from("x"), SqlValue::Null],
                vec![SqlValue::Int(2), SqlValue::from("O'Brien"), SqlValue::Int(42)],
            ],
        );
        let dumper = TableDumper::default();

        let statements = collect(&dumper, "t", &meta, &source).await.unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].as_str(),
            "INSERT INTO `t` (`a`, `b`, `c`) VALUES\n(1, 'x', NULL),\n(2, 'O''Brien', 42);\n"
        );
    }

    #[tokio::test]
    async fn test_postgres_dialect_quoting() {
        let meta = people_snapshot();
        let source = MemorySource::default().with_rows("people", people(1));
        let dumper = TableDumper::new(DialectImpl::Postgres(PostgresDialect::new()));

        let statements = collect(&dumper, "people", &meta, &source).await.unwrap();
        assert_eq!(
            statements[0].sql,
            "INSERT INTO \"people\" (\"id\", \"name\") VALUES\n(1, 'p1');\n"
        );
    }

    #[tokio::test]
    async fn test_empty_table_yields_nothing() {
        let meta = people_snapshot();
        let source = MemorySource::default();
        let dumper = TableDumper::default();

        let statements = collect(&dumper, "people", &meta, &source).await.unwrap();
        assert!(statements.is_empty());
    }

    #[tokio::test]
    async fn test_batch_size_exactly_divides() {
        let meta = people_snapshot();
        let source = MemorySource::default().with_rows("people", people(6));
        let dumper = TableDumper::default().with_batch_size(3);

        let statements = collect(&dumper, "people", &meta, &source).await.unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s.rows == 3));
    }

    #[tokio::test]
    async fn test_fetch_order_uses_primary_key() {
        let meta = SchemaSnapshot::from_tables([Table::new("shop", "line_items")
            .with_columns(&["order_id", "line_no", "sku"])
            .with_primary_key(&["order_id", "line_no"])]);
        let source = MemorySource::default();
        let dumper = TableDumper::default();

        collect(&dumper, "line_items", &meta, &source).await.unwrap();
        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].1, vec!["order_id", "line_no", "sku"]);
        assert_eq!(
            requests[0].2,
            RowOrder::PrimaryKey(vec!["order_id".into(), "line_no".into()])
        );
    }

    #[tokio::test]
    async fn test_no_primary_key_orders_by_all_columns() {
        let meta = SchemaSnapshot::from_tables([
            Table::new("shop", "audit_log").with_columns(&["at", "who", "what"])
        ]);
        let source = MemorySource::default();
        let dumper = TableDumper::default();

        collect(&dumper, "audit_log", &meta, &source).await.unwrap();
        let requests = source.requests.lock().unwrap();
        assert_eq!(
            requests[0].2,
            RowOrder::AllColumns(vec!["at".into(), "who".into(), "what".into()])
        );
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let meta = people_snapshot();
        let source = MemorySource::default();
        let dumper = TableDumper::default();

        let err = collect(&dumper, "ghosts", &meta, &source).await.unwrap_err();
        assert!(matches!(err, DumpError::NotFound(ref t) if t == "ghosts"));
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bytes_value_reports_location() {
        let meta = people_snapshot();
        let mut rows = people(1500);
        rows[1203][1] = SqlValue::Bytes(Cow::Owned(vec![0xde, 0xad]));
        let source = MemorySource::default().with_rows("people", rows);
        let dumper = TableDumper::default();

        let mut stream = dumper.dump("people", &meta, &source).unwrap();
        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.rows, 1000);

        let err = stream.try_next().await.unwrap_err();
        match err {
            DumpError::UnsupportedType {
                table,
                column,
                row,
                type_name,
            } => {
                assert_eq!(table, "people");
                assert_eq!(column, "name");
                assert_eq!(row, 1203);
                assert_eq!(type_name, "bytes");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nan_is_unsupported() {
        let meta = people_snapshot();
        let source = MemorySource::default()
            .with_rows("people", vec![vec![SqlValue::Int(1), SqlValue::Float(f64::NAN)]]);
        let dumper = TableDumper::default();

        let err = collect(&dumper, "people", &meta, &source).await.unwrap_err();
        assert!(matches!(err, DumpError::UnsupportedType { row: 0, .. }));
    }

    #[tokio::test]
    async fn test_row_width_mismatch_is_source_failure() {
        let meta = people_snapshot();
        let source = MemorySource::default()
            .with_rows("people", vec![vec![SqlValue::Int(1)]]);
        let dumper = TableDumper::default();

        let err = collect(&dumper, "people", &meta, &source).await.unwrap_err();
        assert!(matches!(err, DumpError::SourceFailure { ref table, .. } if table == "people"));
        assert!(err.to_string().contains("expected 2"));
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let meta = people_snapshot();
        let source = MemorySource {
            fail_after: Some(1500),
            ..MemorySource::default()
        }
        .with_rows("people", people(2500));
        let dumper = TableDumper::default();

        let mut stream = dumper.dump("people", &meta, &source).unwrap();
        assert_eq!(stream.try_next().await.unwrap().unwrap().rows, 1000);
        let err = stream.try_next().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_batch_size_floor() {
        assert_eq!(TableDumper::default().with_batch_size(0).batch_size(), 1);
        assert_eq!(TableDumper::default().batch_size(), DEFAULT_BATCH_SIZE);
    }
}
