//! PostgreSQL output dialect.
//!
//! Only the dialect is provided: PostgreSQL is a supported target for the
//! generated script, not a source.

mod dialect;

pub use dialect::PostgresDialect;
