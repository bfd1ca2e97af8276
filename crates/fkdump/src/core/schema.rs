//! Schema metadata types for tables, columns and foreign keys.
//!
//! These types are database-agnostic; drivers fill them from their catalog
//! views and the [`SchemaSnapshot`](super::snapshot::SchemaSnapshot) serves
//! them to the core.

use serde::{Deserialize, Serialize};

/// Table metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Schema (database) name.
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Column definitions, in ordinal order.
    pub columns: Vec<Column>,

    /// Primary key column names, in key order.
    pub primary_key: Vec<String>,

    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Create an empty table definition.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add columns by name, with an unspecified data type.
    pub fn with_columns(mut self, names: &[&str]) -> Self {
        for name in names {
            let ordinal_pos = self.columns.len() as i32 + 1;
            self.columns.push(Column {
                name: (*name).to_string(),
                data_type: String::new(),
                is_nullable: true,
                ordinal_pos,
            });
        }
        self
    }

    /// Set the primary key columns.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Add a single-column foreign key `column -> ref_table.ref_column`.
    pub fn with_foreign_key(mut self, column: &str, ref_table: &str, ref_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            name: format!("fk_{}_{}", self.name, column),
            columns: vec![column.to_string()],
            ref_schema: self.schema.clone(),
            ref_table: ref_table.to_string(),
            ref_columns: vec![ref_column.to_string()],
        });
        self
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Referenced tables, deduplicated, in constraint order.
    ///
    /// A composite foreign key contributes a single edge.
    pub fn parent_tables(&self) -> Vec<String> {
        let mut parents: Vec<String> = Vec::with_capacity(self.foreign_keys.len());
        for fk in &self.foreign_keys {
            if !parents.contains(&fk.ref_table) {
                parents.push(fk.ref_table.clone());
            }
        }
        parents
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "int", "varchar", "datetime").
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

/// Foreign key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Source column names.
    pub columns: Vec<String>,

    /// Referenced schema name.
    pub ref_schema: String,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column names.
    pub ref_columns: Vec<String>,
}
