//! In-memory schema snapshot.
//!
//! Drivers load the whole schema once per run into a [`SchemaSnapshot`];
//! the resolver and the dumper then read metadata from memory, so every
//! answer comes from the same point in time.

use std::collections::HashMap;

use crate::error::{DumpError, Result};

use super::schema::Table;
use super::traits::MetadataAccessor;

/// Schema metadata keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    tables: HashMap<String, Table>,
}

impl SchemaSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a list of tables.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        let mut snapshot = Self::new();
        for table in tables {
            snapshot.insert(table);
        }
        snapshot
    }

    /// Add or replace a table.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Get a table by name.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Get a table by name, returning `NotFound` if absent.
    pub fn require(&self, name: &str) -> Result<&Table> {
        self.get(name)
            .ok_or_else(|| DumpError::NotFound(name.to_string()))
    }

    /// Number of tables in the snapshot.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl MetadataAccessor for SchemaSnapshot {
    fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn parents_of(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.require(table)?.parent_tables())
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.require(table)?.primary_key.clone())
    }

    fn columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.require(table)?.column_names())
    }
}
