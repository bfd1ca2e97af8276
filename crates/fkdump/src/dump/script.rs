//! Dump script assembly.

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::traits::{Dialect, MetadataAccessor, RowSource};
use crate::error::{DumpError, Result};

use super::TableDumper;

/// Rows and statements written for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Table name.
    pub name: String,
    /// Rows dumped.
    pub rows: u64,
    /// INSERT statements emitted.
    pub statements: u64,
}

/// Writes a replayable dump script for a resolved table order.
///
/// Layout:
///
/// ```text
/// -- Recursive dump of `orders`
/// -- Tables (parent tables first): `customers`, `orders`
/// SET time_zone = '+00:00';
///
/// DELETE FROM `orders`;        (only with delete_existing, children first)
/// DELETE FROM `customers`;
///
/// -- Dump of table `customers`
/// INSERT INTO `customers` (...) VALUES
/// (...);
///
/// -- Dump of table `orders`
/// -- No rows in `orders`
/// ```
///
/// Temporal values are read in UTC, so the session time zone statement is
/// written even when comments are off. Names that appear in comments have
/// their control characters escaped, so a comment always ends at its own
/// line break.
pub struct ScriptWriter<W> {
    out: W,
    dumper: TableDumper,
    comments: bool,
    delete_existing: bool,
    bytes_written: u64,
}

impl<W: AsyncWrite + Unpin + Send> ScriptWriter<W> {
    /// Create a writer rendering tables with `dumper`.
    pub fn new(out: W, dumper: TableDumper) -> Self {
        Self {
            out,
            dumper,
            comments: true,
            delete_existing: false,
            bytes_written: 0,
        }
    }

    /// Enable or disable `--` comments.
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    /// Emit DELETE statements for every table before the inserts.
    pub fn with_delete_existing(mut self, delete_existing: bool) -> Self {
        self.delete_existing = delete_existing;
        self
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write the complete script for `tables`, which must be in dependency
    /// order (parents first).
    pub async fn write_dump<M, S>(
        &mut self,
        start_table: &str,
        tables: &[String],
        metadata: &M,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<Vec<TableSummary>>
    where
        M: MetadataAccessor + ?Sized,
        S: RowSource + ?Sized,
    {
        self.write_header(start_table, tables).await?;
        if self.delete_existing {
            self.write_deletes(tables).await?;
        }

        let mut summaries = Vec::with_capacity(tables.len());
        for table in tables {
            let summary = self.write_table(table, metadata, source, cancel).await?;
            info!(
                "{}: {} rows in {} statements",
                summary.name, summary.rows, summary.statements
            );
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Script header naming the start table and the dump order, followed
    /// by the statement that puts the replaying session in UTC.
    pub async fn write_header(&mut self, start_table: &str, tables: &[String]) -> Result<()> {
        let mut header = String::new();
        if self.comments {
            let listed = tables
                .iter()
                .map(|t| self.comment_ident(t))
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            header.push_str(&format!(
                "-- Recursive dump of {}\n-- Tables (parent tables first): {}\n",
                self.comment_ident(start_table)?,
                listed
            ));
        }
        header.push_str(self.dumper.dialect().utc_session_statement());
        header.push_str("\n\n");
        self.write(&header).await
    }

    /// DELETE statements in reverse dependency order, so children are
    /// emptied before the parents they reference.
    pub async fn write_deletes(&mut self, tables: &[String]) -> Result<()> {
        let mut block = String::new();
        if self.comments {
            block.push_str("-- Remove existing rows (children first)\n");
        }
        for table in tables.iter().rev() {
            block.push_str(&format!(
                "DELETE FROM {};\n",
                self.dumper.dialect().quote_ident(table)?
            ));
        }
        block.push('\n');
        self.write(&block).await
    }

    /// Write one table's INSERT statements.
    ///
    /// Cancellation is observed while waiting for the next statement.
    pub async fn write_table<M, S>(
        &mut self,
        table: &str,
        metadata: &M,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<TableSummary>
    where
        M: MetadataAccessor + ?Sized,
        S: RowSource + ?Sized,
    {
        if cancel.is_cancelled() {
            return Err(DumpError::Cancelled);
        }

        let quoted = self.comment_ident(table)?;
        if self.comments {
            self.write(&format!("-- Dump of table {}\n", quoted)).await?;
        }

        let mut summary = TableSummary {
            name: table.to_string(),
            rows: 0,
            statements: 0,
        };

        let dumper = self.dumper.clone();
        let mut statements = dumper.dump(table, metadata, source)?;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DumpError::Cancelled),
                next = statements.try_next() => next?,
            };
            let Some(statement) = next else {
                break;
            };
            self.write(statement.as_str()).await?;
            summary.rows += statement.rows as u64;
            summary.statements += 1;
        }

        if summary.rows == 0 {
            debug!("{}: no rows", table);
            if self.comments {
                self.write(&format!("-- No rows in {}\n", quoted)).await?;
            }
        }
        self.write("\n").await?;

        Ok(summary)
    }

    /// Flush and return the underlying writer.
    pub async fn finish(mut self) -> Result<W> {
        self.out.flush().await?;
        Ok(self.out)
    }

    /// Quoted identifier that is safe to place inside a `--` comment.
    fn comment_ident(&self, name: &str) -> Result<String> {
        Ok(comment_safe(&self.dumper.dialect().quote_ident(name)?))
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.bytes_written += text.len() as u64;
        Ok(())
    }
}

/// Escape control characters so `text` stays on a single line.
fn comment_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_control() {
            out.extend(ch.escape_default());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Row, RowOrder, SchemaSnapshot, SqlValue, Table};
    use crate::drivers::{DialectImpl, PostgresDialect};
    use futures::stream::{self, BoxStream, StreamExt};
    use std::collections::HashMap;

    struct MemorySource(HashMap<String, Vec<Row>>);

    impl RowSource for MemorySource {
        fn fetch_rows<'a>(
            &'a self,
            table: &'a str,
            _columns: Vec<String>,
            _order: RowOrder,
        ) -> BoxStream<'a, Result<Row>> {
            let rows = self.0.get(table).cloned().unwrap_or_default();
            stream::iter(rows.into_iter().map(Ok)).boxed()
        }
    }

    fn fixture() -> (SchemaSnapshot, MemorySource) {
        let snapshot = SchemaSnapshot::from_tables([
            Table::new("shop", "customers")
                .with_columns(&["id", "name"])
                .with_primary_key(&["id"]),
            Table::new("shop", "orders")
                .with_columns(&["id", "customer_id"])
                .with_primary_key(&["id"])
                .with_foreign_key("customer_id", "customers", "id"),
        ]);
        let mut rows = HashMap::new();
        rows.insert(
            "customers".to_string(),
            vec![vec![SqlValue::Int(1), SqlValue::from("Ann")]],
        );
        (snapshot, MemorySource(rows))
    }

    fn order() -> Vec<String> {
        vec!["customers".to_string(), "orders".to_string()]
    }

    async fn render(writer: ScriptWriter<Vec<u8>>) -> (String, Vec<TableSummary>) {
        let (snapshot, source) = fixture();
        let mut writer = writer;
        let summaries = writer
            .write_dump("orders", &order(), &snapshot, &source, &CancellationToken::new())
            .await
            .unwrap();
        let bytes = writer.finish().await.unwrap();
        (String::from_utf8(bytes).unwrap(), summaries)
    }

    #[tokio::test]
    async fn test_script_with_comments() {
        let writer = ScriptWriter::new(Vec::new(), TableDumper::default());
        let (script, summaries) = render(writer).await;

        assert_eq!(
            script,
            "-- Recursive dump of `orders`\n\
             -- Tables (parent tables first): `customers`, `orders`\n\
             SET time_zone = '+00:00';\n\
             \n\
             -- Dump of table `customers`\n\
             INSERT INTO `customers` (`id`, `name`) VALUES\n\
             (1, 'Ann');\n\
             \n\
             -- Dump of table `orders`\n\
             -- No rows in `orders`\n\
             \n"
        );
        assert_eq!(summaries[0].rows, 1);
        assert_eq!(summaries[0].statements, 1);
        assert_eq!(summaries[1].rows, 0);
        assert_eq!(summaries[1].statements, 0);
    }

    #[tokio::test]
    async fn test_script_without_comments() {
        let writer = ScriptWriter::new(Vec::new(), TableDumper::default()).with_comments(false);
        let (script, _) = render(writer).await;

        assert!(!script.contains("--"));
        assert!(script.starts_with("SET time_zone = '+00:00';\n\nINSERT INTO `customers`"));
    }

    #[tokio::test]
    async fn test_deletes_in_reverse_order() {
        let writer = ScriptWriter::new(Vec::new(), TableDumper::default())
            .with_comments(false)
            .with_delete_existing(true);
        let (script, _) = render(writer).await;

        assert!(script.starts_with(
            "SET time_zone = '+00:00';\n\nDELETE FROM `orders`;\nDELETE FROM `customers`;\n\n"
        ));
        let last_delete = script.rfind("DELETE").unwrap();
        let first_insert = script.find("INSERT").unwrap();
        assert!(last_delete < first_insert);
    }

    #[tokio::test]
    async fn test_line_breaks_in_names_stay_inside_comments() {
        let evil = "evil\nDROP DATABASE shop; -- ";
        let snapshot = SchemaSnapshot::from_tables([Table::new("shop", evil)
            .with_columns(&["id"])
            .with_primary_key(&["id"])]);
        let mut rows = HashMap::new();
        rows.insert(evil.to_string(), vec![vec![SqlValue::Int(1)]]);
        let source = MemorySource(rows);

        let mut writer = ScriptWriter::new(Vec::new(), TableDumper::default());
        writer
            .write_dump(evil, &[evil.to_string()], &snapshot, &source, &CancellationToken::new())
            .await
            .unwrap();
        let script = String::from_utf8(writer.finish().await.unwrap()).unwrap();

        assert!(script.contains("-- Recursive dump of `evil\\nDROP DATABASE shop; -- `\n"));
        assert!(script.contains("-- Dump of table `evil\\nDROP DATABASE shop; -- `\n"));

        // The only line outside a comment that mentions the name is the
        // continuation of the quoted identifier in the INSERT.
        let exposed: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with("DROP"))
            .collect();
        assert_eq!(exposed, vec!["DROP DATABASE shop; -- ` (`id`) VALUES"]);
    }

    #[tokio::test]
    async fn test_postgres_header_sets_utc() {
        let dumper = TableDumper::new(DialectImpl::Postgres(PostgresDialect::new()));
        let writer = ScriptWriter::new(Vec::new(), dumper).with_comments(false);
        let (script, _) = render(writer).await;

        assert!(script.starts_with("SET TIME ZONE 'UTC';\n\nINSERT INTO \"customers\""));
    }

    #[test]
    fn test_comment_safe_escapes_control_characters() {
        assert_eq!(comment_safe("`orders`"), "`orders`");
        assert_eq!(comment_safe("a\nb\rc\td"), "a\\nb\\rc\\td");
        assert_eq!(comment_safe("x\u{1b}y"), "x\\u{1b}y");
        assert!(!comment_safe("\n\r\u{85}").contains(&['\n', '\r', '\u{85}'][..]));
    }

    #[tokio::test]
    async fn test_bytes_written_matches_output() {
        let (snapshot, source) = fixture();
        let mut writer = ScriptWriter::new(Vec::new(), TableDumper::default());
        writer
            .write_dump("orders", &order(), &snapshot, &source, &CancellationToken::new())
            .await
            .unwrap();
        let written = writer.bytes_written();
        let bytes = writer.finish().await.unwrap();
        assert_eq!(written, bytes.len() as u64);
    }

    #[tokio::test]
    async fn test_cancelled_before_table() {
        let (snapshot, source) = fixture();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut writer = ScriptWriter::new(Vec::new(), TableDumper::default());
        let err = writer
            .write_dump("orders", &order(), &snapshot, &source, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Cancelled));
    }
}
