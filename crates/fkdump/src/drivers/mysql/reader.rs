//! MySQL/MariaDB source reader implementation.
//!
//! Loads the schema snapshot from `INFORMATION_SCHEMA` and implements
//! [`RowSource`]. Uses SQLx for connection pooling and async query execution.
//!
//! # Row retrieval
//!
//! Tables with a primary key are read in keyset pages: each page selects
//! the rows whose key is greater than the last key already returned, so a
//! page costs the same wherever it starts. Keys that include an `ENUM` or
//! `SET` column sort by member index but compare as strings; such tables
//! fall back to `LIMIT`/`OFFSET` pages over the same unique order.
//!
//! Tables without a primary key are ordered by all of their columns, and
//! rows may tie under that order. They are read with a single streamed
//! `SELECT`, with rows handed to the consumer through a bounded channel.
//!
//! # Consistency
//!
//! Each statement is a consistent read on its own. A keyset scan returns
//! every row that exists for the whole scan exactly once, but pages are
//! separate statements: rows inserted or deleted while a table is being
//! read may or may not appear. Tables are read one after another, not from
//! a single snapshot. Dumping a database that is being written to can
//! therefore produce child rows whose parents were not captured.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{
    MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode,
};
use sqlx::query::Query;
use sqlx::{Column as _, MySql, Row as _, TypeInfo, ValueRef};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::schema::{Column, ForeignKey, Table};
use crate::core::snapshot::SchemaSnapshot;
use crate::core::traits::{RowOrder, RowSource};
use crate::core::value::{Row, SqlValue};
use crate::error::{DumpError, Result};

use super::dialect::{MysqlDialect, SelectQueryOptions};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// How a MySQL column type is decoded into a [`SqlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Int,
    UInt,
    Float,
    Decimal,
    Date,
    Time,
    DateTime,
    Bytes,
    Text,
}

impl ValueKind {
    /// Classify a SQLx MySQL type name (e.g. `"BIGINT UNSIGNED"`).
    fn from_type_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        if upper.ends_with("UNSIGNED") {
            return ValueKind::UInt;
        }
        match upper.as_str() {
            "BOOLEAN" => ValueKind::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ValueKind::Int,
            "YEAR" | "BIT" => ValueKind::UInt,
            "FLOAT" | "DOUBLE" => ValueKind::Float,
            "DECIMAL" => ValueKind::Decimal,
            "DATE" => ValueKind::Date,
            "TIME" => ValueKind::Time,
            "DATETIME" | "TIMESTAMP" => ValueKind::DateTime,
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB"
            | "GEOMETRY" => ValueKind::Bytes,
            // CHAR, VARCHAR, TEXT variants, ENUM, SET, JSON
            _ => ValueKind::Text,
        }
    }
}

/// Whether `>` on a column of this type agrees with its `ORDER BY` order.
fn keyset_comparable(type_name: &str) -> bool {
    !matches!(type_name.to_ascii_uppercase().as_str(), "ENUM" | "SET")
}

/// Position of a paged scan over a unique order.
#[derive(Debug, Clone, PartialEq)]
enum PageCursor {
    /// Rows with a key greater than `after`; `None` starts at the beginning.
    /// `read` counts the rows returned so far.
    Key {
        after: Option<Vec<SqlValue<'static>>>,
        read: u64,
    },
    /// Rows after skipping this many.
    Offset(u64),
    /// The previous page was the last one.
    Done,
}

impl PageCursor {
    fn start() -> Self {
        PageCursor::Key {
            after: None,
            read: 0,
        }
    }
}

/// MySQL/MariaDB source reader implementation.
pub struct MysqlReader {
    pool: MySqlPool,
    database: String,
    dialect: MysqlDialect,
    page_size: usize,
}

impl MysqlReader {
    /// Create a new MySQL reader from configuration.
    ///
    /// `page_size` is the number of rows fetched per keyset page, and the
    /// number of rows buffered ahead of the consumer for streamed tables.
    pub async fn new(config: &SourceConfig, max_conns: u32, page_size: usize) -> Result<Self> {
        // SQLx puts every session in UTC, so TIMESTAMP values are read as UTC.
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(parse_ssl_mode(&config.ssl_mode)?);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| DumpError::pool(e, "creating MySQL source pool"))?;

        // Test connection
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| DumpError::pool(e, "testing MySQL source connection"))?;

        info!(
            "Connected to MySQL source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool,
            database: config.database.clone(),
            dialect: MysqlDialect::new(),
            page_size: page_size.max(1),
        })
    }

    /// Database (schema) this reader is connected to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Test the database connection and return the round-trip latency.
    pub async fn health_check(&self) -> Result<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DumpError::pool(e, "testing MySQL connection"))?;
        Ok(start.elapsed())
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Load every base table of the connected database into a snapshot.
    ///
    /// Four catalog queries cover the whole schema, so the snapshot is
    /// read once and never refreshed during a run.
    pub async fn load_snapshot(&self) -> Result<SchemaSnapshot> {
        let schema = self.database.as_str();

        // CAST to CHAR to handle collation differences where information_schema
        // may return VARBINARY instead of VARCHAR
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DumpError::pool(e, "listing MySQL tables"))?;

        let mut tables: HashMap<String, Table> = HashMap::with_capacity(rows.len());
        for row in rows {
            let name: String = row
                .try_get("TABLE_NAME")
                .map_err(|e| DumpError::pool(e, "reading table name"))?;
            tables.insert(name.clone(), Table::new(schema, name));
        }

        self.load_columns(schema, &mut tables).await?;
        self.load_primary_keys(schema, &mut tables).await?;
        self.load_foreign_keys(schema, &mut tables).await?;

        info!(
            "Loaded schema snapshot of '{}': {} tables",
            schema,
            tables.len()
        );
        Ok(SchemaSnapshot::from_tables(tables.into_values()))
    }

    async fn load_columns(&self, schema: &str, tables: &mut HashMap<String, Table>) -> Result<()> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(DATA_TYPE AS CHAR(255)) AS DATA_TYPE,
                IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                CAST(ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ?
            ORDER BY TABLE_NAME, ORDINAL_POSITION
            "#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DumpError::pool(e, "loading MySQL columns"))?;

        for row in rows {
            let table_name: String = get(&row, "TABLE_NAME", "loading MySQL columns")?;
            // Views appear in COLUMNS but not in the base table list
            let Some(table) = tables.get_mut(&table_name) else {
                continue;
            };
            table.columns.push(Column {
                name: get(&row, "COLUMN_NAME", "loading MySQL columns")?,
                data_type: get(&row, "DATA_TYPE", "loading MySQL columns")?,
                is_nullable: get::<i64>(&row, "is_nullable", "loading MySQL columns")? == 1,
                ordinal_pos: get::<i64>(&row, "ORDINAL_POSITION", "loading MySQL columns")? as i32,
            });
        }

        Ok(())
    }

    async fn load_primary_keys(
        &self,
        schema: &str,
        tables: &mut HashMap<String, Table>,
    ) -> Result<()> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ? AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY TABLE_NAME, ORDINAL_POSITION
            "#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DumpError::pool(e, "loading MySQL primary keys"))?;

        for row in rows {
            let table_name: String = get(&row, "TABLE_NAME", "loading MySQL primary keys")?;
            if let Some(table) = tables.get_mut(&table_name) {
                table
                    .primary_key
                    .push(get(&row, "COLUMN_NAME", "loading MySQL primary keys")?);
            }
        }

        Ok(())
    }

    async fn load_foreign_keys(
        &self,
        schema: &str,
        tables: &mut HashMap<String, Table>,
    ) -> Result<()> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(rc.TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
                CAST(rc.CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME,
                CAST(kcu.COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(kcu.REFERENCED_TABLE_SCHEMA AS CHAR(255)) AS REFERENCED_TABLE_SCHEMA,
                CAST(kcu.REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
                CAST(kcu.REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME
            FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
                AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                AND rc.TABLE_NAME = kcu.TABLE_NAME
            WHERE rc.CONSTRAINT_SCHEMA = ?
            ORDER BY rc.TABLE_NAME, rc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
            "#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DumpError::pool(e, "loading MySQL foreign keys"))?;

        const CONTEXT: &str = "loading MySQL foreign keys";
        let mut fk_count = 0usize;
        for row in rows {
            let table_name: String = get(&row, "TABLE_NAME", CONTEXT)?;
            let Some(table) = tables.get_mut(&table_name) else {
                continue;
            };
            let name: String = get(&row, "CONSTRAINT_NAME", CONTEXT)?;
            let column: String = get(&row, "COLUMN_NAME", CONTEXT)?;
            let ref_column: String = get(&row, "REFERENCED_COLUMN_NAME", CONTEXT)?;

            // Rows arrive grouped by constraint, so a composite key extends
            // the last entry.
            match table.foreign_keys.last_mut() {
                Some(fk) if fk.name == name => {
                    fk.columns.push(column);
                    fk.ref_columns.push(ref_column);
                }
                _ => {
                    fk_count += 1;
                    table.foreign_keys.push(ForeignKey {
                        name,
                        columns: vec![column],
                        ref_schema: get(&row, "REFERENCED_TABLE_SCHEMA", CONTEXT)?,
                        ref_table: get(&row, "REFERENCED_TABLE_NAME", CONTEXT)?,
                        ref_columns: vec![ref_column],
                    });
                }
            }
        }

        debug!("Loaded {} foreign keys from '{}'", fk_count, schema);
        Ok(())
    }

    /// Fetch the page at `cursor` and compute the cursor of the following one.
    async fn next_page(
        &self,
        table: &str,
        width: usize,
        key_idx: &[usize],
        base: SelectQueryOptions,
        cursor: PageCursor,
    ) -> Result<Option<(Vec<Row>, PageCursor)>> {
        let (opts, after, read) = match cursor {
            PageCursor::Done => return Ok(None),
            PageCursor::Key { after, read } => (
                base.with_keyset(after.is_some()).with_page(self.page_size, 0),
                after,
                Some(read),
            ),
            PageCursor::Offset(offset) => (base.with_page(self.page_size, offset), None, None),
        };
        let sql = self.dialect.build_select_query(&opts)?;
        debug!("{}: fetching page: {}", table, sql);

        let rows: Vec<MySqlRow> = bind_key(sqlx::query(&sql), after.as_deref().unwrap_or_default())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DumpError::source_failure(table, e))?;
        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let comparable = key_idx.iter().all(|&i| {
            first
                .columns()
                .get(i)
                .is_some_and(|c| keyset_comparable(c.type_info().name()))
        });

        let values: Vec<Row> = rows
            .iter()
            .map(|row| row_to_values(row, width).map_err(|e| DumpError::source_failure(table, e)))
            .collect::<Result<_>>()?;
        let fetched = values.len() as u64;

        let next = if values.len() < self.page_size {
            PageCursor::Done
        } else {
            match (read, opts.offset) {
                (Some(read), _) => match values.last().and_then(|row| last_key(row, key_idx)) {
                    Some(key) if comparable => PageCursor::Key {
                        after: Some(key),
                        read: read + fetched,
                    },
                    _ => {
                        debug!("{}: key not usable for keyset paging, falling back to OFFSET", table);
                        PageCursor::Offset(read + fetched)
                    }
                },
                (None, offset) => PageCursor::Offset(offset.unwrap_or_default() + fetched),
            }
        };
        Ok(Some((values, next)))
    }

    /// Read a whole table with one statement, handing rows over through a
    /// channel of `page_size` rows.
    fn stream_rows(
        &self,
        table: &str,
        width: usize,
        opts: SelectQueryOptions,
    ) -> BoxStream<'static, Result<Row>> {
        let sql = match self.dialect.build_select_query(&opts) {
            Ok(sql) => sql,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        debug!("{}: streaming rows: {}", table, sql);

        let (tx, rx) = mpsc::channel::<Result<Row>>(self.page_size);
        let pool = self.pool.clone();
        let table = table.to_string();
        tokio::spawn(async move {
            let mut rows = sqlx::query(&sql).fetch(&pool);
            while let Some(row) = rows.next().await {
                let item = row
                    .map_err(|e| DumpError::source_failure(&table, e))
                    .and_then(|row| {
                        row_to_values(&row, width).map_err(|e| DumpError::source_failure(&table, e))
                    });
                let failed = item.is_err();
                // A closed channel means the consumer dropped the stream.
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
    }
}

impl RowSource for MysqlReader {
    fn fetch_rows<'a>(
        &'a self,
        table: &'a str,
        columns: Vec<String>,
        order: RowOrder,
    ) -> BoxStream<'a, Result<Row>> {
        let width = columns.len();
        let key_idx: Vec<usize> = order
            .columns()
            .iter()
            .filter_map(|k| columns.iter().position(|c| c == k))
            .collect();
        let unique = order.is_unique() && key_idx.len() == order.columns().len();

        let base = SelectQueryOptions::new(table, columns)
            .with_schema(self.database.clone())
            .with_order_by(order.columns().to_vec());

        if !unique {
            return self.stream_rows(table, width, base);
        }

        let pages = stream::try_unfold(PageCursor::start(), move |cursor| {
            let opts = base.clone();
            let key_idx = key_idx.clone();
            async move { self.next_page(table, width, &key_idx, opts, cursor).await }
        });

        pages
            .map_ok(|rows| stream::iter(rows.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }
}

/// Key of `row` at `key_idx`, or `None` if a key value cannot be bound.
fn last_key(row: &Row, key_idx: &[usize]) -> Option<Vec<SqlValue<'static>>> {
    key_idx
        .iter()
        .map(|&i| match row.get(i)? {
            SqlValue::Null => None,
            SqlValue::Float(f) if !f.is_finite() => None,
            value => Some(value.clone()),
        })
        .collect()
}

/// Bind key values as the parameters of a keyset condition.
fn bind_key<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    key: &[SqlValue<'static>],
) -> Query<'q, MySql, MySqlArguments> {
    for value in key {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::UInt(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Decimal(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.to_string()),
            SqlValue::Bytes(v) => query.bind(v.to_vec()),
        };
    }
    query
}

/// Parse the configured SSL mode.
fn parse_ssl_mode(mode: &str) -> Result<MySqlSslMode> {
    match mode.to_lowercase().as_str() {
        "disable" | "disabled" => Ok(MySqlSslMode::Disabled),
        "preferred" => Ok(MySqlSslMode::Preferred),
        "required" => Ok(MySqlSslMode::Required),
        other => Err(DumpError::Config(format!("Unknown ssl_mode: '{}'", other))),
    }
}

/// Read a catalog column, mapping decode failures to a pool error.
fn get<'r, T>(row: &'r MySqlRow, column: &str, context: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(column)
        .map_err(|e| DumpError::pool(e, context.to_string()))
}

/// Convert a MySQL row to a [`Row`] of owned values.
fn row_to_values(row: &MySqlRow, width: usize) -> std::result::Result<Row, String> {
    if row.len() != width {
        return Err(format!(
            "row has {} values, expected {}",
            row.len(),
            width
        ));
    }
    (0..width).map(|i| decode_value(row, i)).collect()
}

/// Decode a single column of a MySQL row.
fn decode_value(row: &MySqlRow, idx: usize) -> std::result::Result<SqlValue<'static>, String> {
    let column = row.column(idx);
    let is_null = row
        .try_get_raw(idx)
        .map(|r| r.is_null())
        .map_err(|e| format!("column {}: {}", column.name(), e))?;
    if is_null {
        return Ok(SqlValue::Null);
    }

    let kind = ValueKind::from_type_name(column.type_info().name());
    let value = match kind {
        ValueKind::Bool => row.try_get::<bool, _>(idx).map(|b| SqlValue::Int(b as i64)),
        ValueKind::Int => row.try_get::<i64, _>(idx).map(SqlValue::Int),
        ValueKind::UInt => row.try_get::<u64, _>(idx).map(SqlValue::UInt),
        ValueKind::Float => row.try_get::<f64, _>(idx).map(SqlValue::Float),
        ValueKind::Decimal => row
            .try_get::<rust_decimal::Decimal, _>(idx)
            .map(SqlValue::Decimal),
        ValueKind::Date | ValueKind::DateTime => {
            // Read the wire value: zero dates such as 0000-00-00 have no
            // calendar representation.
            let raw = row
                .try_get_unchecked::<&[u8], _>(idx)
                .map_err(|e| format!("column {}: {}", column.name(), e))?;
            return format_binary_date(raw, kind == ValueKind::DateTime)
                .map(|text| SqlValue::Text(Cow::Owned(text)))
                .map_err(|e| format!("column {}: {}", column.name(), e));
        }
        ValueKind::Time => row
            .try_get::<MySqlTime, _>(idx)
            .map(|t| SqlValue::Text(Cow::Owned(format_time(&t)))),
        ValueKind::Bytes => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|b| SqlValue::Bytes(Cow::Owned(b))),
        ValueKind::Text => row
            .try_get::<String, _>(idx)
            .map(|s| SqlValue::Text(Cow::Owned(s))),
    };

    value.map_err(|e| format!("column {}: {}", column.name(), e))
}

/// Render a binary-protocol DATE, DATETIME or TIMESTAMP value the way
/// MySQL prints it.
///
/// The value keeps its length prefix: 0 bytes for an all-zero value, 4 for
/// a date, 7 with seconds and 11 with microseconds. Zero and partially zero
/// dates are rendered as stored.
fn format_binary_date(raw: &[u8], with_time: bool) -> std::result::Result<String, String> {
    let Some((&len, body)) = raw.split_first() else {
        return Err("empty temporal value".to_string());
    };
    if len as usize != body.len() {
        return Err(format!(
            "temporal value declares {} bytes but has {}",
            len,
            body.len()
        ));
    }

    let (mut year, mut month, mut day) = (0u16, 0u8, 0u8);
    let (mut hour, mut minute, mut second, mut micros) = (0u8, 0u8, 0u8, 0u32);
    match body.len() {
        0 => {}
        4 | 7 | 11 => {
            year = u16::from_le_bytes([body[0], body[1]]);
            month = body[2];
            day = body[3];
            if body.len() >= 7 {
                hour = body[4];
                minute = body[5];
                second = body[6];
            }
            if body.len() == 11 {
                micros = u32::from_le_bytes([body[7], body[8], body[9], body[10]]);
            }
        }
        n => return Err(format!("unexpected {}-byte temporal value", n)),
    }

    let date = format!("{:04}-{:02}-{:02}", year, month, day);
    if !with_time {
        return Ok(date);
    }
    Ok(format!(
        "{} {:02}:{:02}:{:02}{}",
        date,
        hour,
        minute,
        second,
        format_fraction(micros)
    ))
}

/// Render a TIME value over its full range (-838:59:59 to 838:59:59).
fn format_time(t: &MySqlTime) -> String {
    format!(
        "{}{:02}:{:02}:{:02}{}",
        if t.is_negative() { "-" } else { "" },
        t.hours(),
        t.minutes(),
        t.seconds(),
        format_fraction(t.microseconds())
    )
}

/// Fractional seconds with 3 or 6 digits, or nothing when zero.
fn format_fraction(micros: u32) -> String {
    if micros == 0 {
        String::new()
    } else if micros % 1000 == 0 {
        format!(".{:03}", micros / 1000)
    } else {
        format!(".{:06}", micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::mysql::types::MySqlTimeSign;

    #[test]
    fn test_value_kind_integers() {
        assert_eq!(ValueKind::from_type_name("INT"), ValueKind::Int);
        assert_eq!(ValueKind::from_type_name("BIGINT"), ValueKind::Int);
        assert_eq!(ValueKind::from_type_name("tinyint"), ValueKind::Int);
        assert_eq!(ValueKind::from_type_name("BIGINT UNSIGNED"), ValueKind::UInt);
        assert_eq!(ValueKind::from_type_name("INT UNSIGNED"), ValueKind::UInt);
        assert_eq!(ValueKind::from_type_name("BOOLEAN"), ValueKind::Bool);
    }

    #[test]
    fn test_value_kind_other_types() {
        assert_eq!(ValueKind::from_type_name("DECIMAL"), ValueKind::Decimal);
        assert_eq!(ValueKind::from_type_name("DOUBLE"), ValueKind::Float);
        assert_eq!(ValueKind::from_type_name("DATETIME"), ValueKind::DateTime);
        assert_eq!(ValueKind::from_type_name("TIMESTAMP"), ValueKind::DateTime);
        assert_eq!(ValueKind::from_type_name("BLOB"), ValueKind::Bytes);
        assert_eq!(ValueKind::from_type_name("VARBINARY"), ValueKind::Bytes);
        assert_eq!(ValueKind::from_type_name("VARCHAR"), ValueKind::Text);
        assert_eq!(ValueKind::from_type_name("JSON"), ValueKind::Text);
        assert_eq!(ValueKind::from_type_name("ENUM"), ValueKind::Text);
    }

    #[test]
    fn test_binary_dates() {
        // 2024-02-29
        let date = [4, 0xe8, 0x07, 2, 29];
        assert_eq!(format_binary_date(&date, false).unwrap(), "2024-02-29");
        assert_eq!(format_binary_date(&date, true).unwrap(), "2024-02-29 00:00:00");

        // 2024-02-29 07:05:09
        let seconds = [7, 0xe8, 0x07, 2, 29, 7, 5, 9];
        assert_eq!(format_binary_date(&seconds, true).unwrap(), "2024-02-29 07:05:09");

        // 2024-02-29 23:59:59.250000
        let mut micros = vec![11, 0xe8, 0x07, 2, 29, 23, 59, 59];
        micros.extend_from_slice(&250_000u32.to_le_bytes());
        assert_eq!(
            format_binary_date(&micros, true).unwrap(),
            "2024-02-29 23:59:59.250"
        );
    }

    #[test]
    fn test_zero_dates_are_kept() {
        assert_eq!(format_binary_date(&[0], false).unwrap(), "0000-00-00");
        assert_eq!(format_binary_date(&[0], true).unwrap(), "0000-00-00 00:00:00");

        // 2024-00-00, accepted by servers without NO_ZERO_IN_DATE
        let partial = [4, 0xe8, 0x07, 0, 0];
        assert_eq!(format_binary_date(&partial, false).unwrap(), "2024-00-00");
    }

    #[test]
    fn test_malformed_binary_dates() {
        assert!(format_binary_date(&[], false).is_err());
        assert!(format_binary_date(&[4, 0xe8, 0x07], false).is_err());
        assert!(format_binary_date(&[2, 0xe8, 0x07], false).is_err());
    }

    #[test]
    fn test_time_full_range() {
        let time = MySqlTime::new(MySqlTimeSign::Positive, 7, 5, 9, 0).unwrap();
        assert_eq!(format_time(&time), "07:05:09");

        let long = MySqlTime::new(MySqlTimeSign::Positive, 838, 59, 59, 0).unwrap();
        assert_eq!(format_time(&long), "838:59:59");

        let negative = MySqlTime::new(MySqlTimeSign::Negative, 838, 59, 59, 0).unwrap();
        assert_eq!(format_time(&negative), "-838:59:59");

        let fraction = MySqlTime::new(MySqlTimeSign::Negative, 0, 0, 1, 500_000).unwrap();
        assert_eq!(format_time(&fraction), "-00:00:01.500");
    }

    #[test]
    fn test_format_fraction() {
        assert_eq!(format_fraction(0), "");
        assert_eq!(format_fraction(250_000), ".250");
        assert_eq!(format_fraction(123_456), ".123456");
        assert_eq!(format_fraction(1), ".000001");
    }

    #[test]
    fn test_keyset_comparable_types() {
        assert!(keyset_comparable("INT"));
        assert!(keyset_comparable("VARCHAR"));
        assert!(keyset_comparable("DATETIME"));
        assert!(!keyset_comparable("ENUM"));
        assert!(!keyset_comparable("set"));
    }

    #[test]
    fn test_last_key_follows_key_columns() {
        let row: Row = vec![
            SqlValue::Int(7),
            SqlValue::from("lamp"),
            SqlValue::from("A-1"),
        ];
        assert_eq!(
            last_key(&row, &[0, 2]),
            Some(vec![SqlValue::Int(7), SqlValue::from("A-1")])
        );
        assert_eq!(last_key(&row, &[]), Some(vec![]));

        let nullable: Row = vec![SqlValue::Null, SqlValue::Int(1)];
        assert_eq!(last_key(&nullable, &[0, 1]), None);
        assert_eq!(last_key(&vec![SqlValue::Float(f64::NAN)], &[0]), None);
    }

    #[test]
    fn test_page_cursor_starts_before_first_key() {
        assert_eq!(
            PageCursor::start(),
            PageCursor::Key {
                after: None,
                read: 0
            }
        );
    }

    #[test]
    fn test_parse_ssl_mode() {
        assert!(matches!(parse_ssl_mode("disable"), Ok(MySqlSslMode::Disabled)));
        assert!(matches!(parse_ssl_mode("Preferred"), Ok(MySqlSslMode::Preferred)));
        assert!(matches!(parse_ssl_mode("required"), Ok(MySqlSslMode::Required)));
        assert!(parse_ssl_mode("verify_everything").is_err());
    }
}
