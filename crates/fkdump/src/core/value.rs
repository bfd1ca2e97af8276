//! SQL value types for rows pulled from the source database.
//!
//! Only a subset of values has a literal encoding in the dump output:
//! NULL, numbers and strings. Other values are still represented so the
//! dumper can reject them with a precise error instead of guessing.

use std::borrow::Cow;

use rust_decimal::Decimal;

/// SQL value enum for type-safe row handling.
///
/// Uses `Cow` for string and byte data so test fixtures and drivers can
/// hand over borrowed data without copying.
///
/// # Example
///
/// ```rust
/// use std::borrow::Cow;
/// use fkdump::core::SqlValue;
///
/// let borrowed: SqlValue<'_> = SqlValue::Text(Cow::Borrowed("hello"));
/// let owned: SqlValue<'static> = borrowed.into_owned();
/// assert!(!owned.is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// NULL.
    Null,

    /// Signed integer (tinyint through bigint).
    Int(i64),

    /// Unsigned integer (bigint unsigned).
    UInt(u64),

    /// Floating point (float/double).
    Float(f64),

    /// Exact decimal.
    Decimal(Decimal),

    /// Text data, including temporal values rendered by the driver.
    Text(Cow<'a, str>),

    /// Binary data. Has no literal encoding.
    Bytes(Cow<'a, [u8]>),
}

/// A single row, values aligned with the table's column list.
pub type Row = Vec<SqlValue<'static>>;

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Int(v) => SqlValue::Int(v),
            SqlValue::UInt(v) => SqlValue::UInt(v),
            SqlValue::Float(v) => SqlValue::Float(v),
            SqlValue::Decimal(v) => SqlValue::Decimal(v),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "int",
            SqlValue::UInt(_) => "uint",
            SqlValue::Float(_) => "float",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
        }
    }
}

impl SqlValue<'static> {
    /// Create a text value from an owned String.
    #[must_use]
    pub fn text_owned(s: String) -> Self {
        SqlValue::Text(Cow::Owned(s))
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u64> for SqlValue<'static> {
    fn from(v: u64) -> Self {
        SqlValue::UInt(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl<'a, T> From<Option<T>> for SqlValue<'a>
where
    T: Into<SqlValue<'a>>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}
