//! Database driver implementations.
//!
//! - [`mysql`]: MySQL/MariaDB source (schema snapshot + row source) and dialect
//! - [`postgres`]: PostgreSQL output dialect
//!
//! # Static dispatch
//!
//! Dialects are selected at runtime from configuration but dispatched
//! through the [`DialectImpl`] enum rather than a trait object.

pub mod mysql;
pub mod postgres;

pub use mysql::{MysqlDialect, MysqlReader};
pub use postgres::PostgresDialect;

use crate::core::traits::Dialect;
use crate::error::{DumpError, Result};

/// Enum-based static dispatch for dialects.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Mysql(MysqlDialect),
    Postgres(PostgresDialect),
}

impl Default for DialectImpl {
    fn default() -> Self {
        DialectImpl::Mysql(MysqlDialect::new())
    }
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Mysql(d) => d.name(),
            DialectImpl::Postgres(d) => d.name(),
        }
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            DialectImpl::Mysql(d) => d.quote_ident(name),
            DialectImpl::Postgres(d) => d.quote_ident(name),
        }
    }

    fn quote_string(&self, value: &str) -> String {
        match self {
            DialectImpl::Mysql(d) => d.quote_string(value),
            DialectImpl::Postgres(d) => d.quote_string(value),
        }
    }

    fn utc_session_statement(&self) -> &'static str {
        match self {
            DialectImpl::Mysql(d) => d.utc_session_statement(),
            DialectImpl::Postgres(d) => d.utc_session_statement(),
        }
    }
}

impl DialectImpl {
    /// Create a dialect implementation from a database type string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database type is not recognized.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DialectImpl::Mysql(MysqlDialect::new())),
            "postgres" | "postgresql" | "pg" => Ok(DialectImpl::Postgres(PostgresDialect::new())),
            other => Err(DumpError::Config(format!(
                "Unknown dialect: '{}'. Supported dialects: mysql, postgres",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_impl_from_db_type() {
        let mysql = DialectImpl::from_db_type("mysql").unwrap();
        assert_eq!(mysql.name(), "mysql");

        let postgres = DialectImpl::from_db_type("postgres").unwrap();
        assert_eq!(postgres.name(), "postgres");

        assert!(DialectImpl::from_db_type("MariaDB").is_ok());
        assert!(DialectImpl::from_db_type("postgresql").is_ok());
        assert!(DialectImpl::from_db_type("pg").is_ok());

        let err = DialectImpl::from_db_type("mssql").unwrap_err();
        assert!(err.to_string().contains("Supported dialects"));
    }

    #[test]
    fn test_dialect_impl_dispatch() {
        let dialect = DialectImpl::default();
        assert_eq!(dialect.name(), "mysql");
        assert_eq!(dialect.quote_ident("order").unwrap(), "`order`");

        let dialect = DialectImpl::Postgres(PostgresDialect::new());
        assert_eq!(dialect.quote_ident("order").unwrap(), "\"order\"");
        assert_eq!(dialect.quote_string("it's"), "'it''s'");
        assert_eq!(dialect.utc_session_statement(), "SET TIME ZONE 'UTC';");
    }
}
