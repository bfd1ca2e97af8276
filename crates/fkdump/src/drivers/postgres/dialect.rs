//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Used when the dump script is meant to be replayed into PostgreSQL:
//! double-quoted identifiers and standard-conforming string literals.

use crate::core::identifier::quote_pg;
use crate::core::traits::Dialect;
use crate::error::Result;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_pg(name)
    }

    fn quote_string(&self, value: &str) -> String {
        // standard_conforming_strings is on by default: only quotes need doubling
        format!("'{}'", value.replace('\'', "''"))
    }

    fn utc_session_statement(&self) -> &'static str {
        "SET TIME ZONE 'UTC';"
    }
}
