//! Core abstractions for foreign-key aware dumps.
//!
//! - [`schema`]: Table, column and foreign key metadata types
//! - [`snapshot`]: In-memory schema snapshot implementing [`MetadataAccessor`]
//! - [`value`]: SQL value representation for fetched rows
//! - [`identifier`]: Identifier validation and quoting
//! - [`traits`]: Metadata, row source and dialect traits
//!
//! The resolver and dumper depend only on this module; drivers implement
//! its traits.

pub mod identifier;
pub mod schema;
pub mod snapshot;
pub mod traits;
pub mod value;

pub use schema::{Column, ForeignKey, Table};
pub use snapshot::SchemaSnapshot;
pub use traits::{Dialect, MetadataAccessor, RowOrder, RowSource};
pub use value::{Row, SqlValue};
