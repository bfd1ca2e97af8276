//! # fkdump
//!
//! Foreign-key aware table dumps for MySQL.
//!
//! Given a start table, this library finds every table it depends on through
//! foreign keys and writes a SQL script that recreates the start table's rows
//! together with all of their parents:
//!
//! - **Dependency resolution** with parents ordered before children
//! - **Batched multi-row INSERTs** with a configurable batch size
//! - **Lazy row streaming**, so large tables are never held in memory
//! - **MySQL or PostgreSQL** quoting rules for the generated script
//!
//! ## Example
//!
//! ```rust,no_run
//! use fkdump::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> fkdump::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator
//!         .run("orders", None, &CancellationToken::new())
//!         .await?;
//!     println!("Dumped {} rows to {}", result.rows_total, result.output.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod dump;
pub mod error;
pub mod orchestrator;
pub mod resolve;

// Re-exports for convenient access
pub use config::{Config, DumpConfig, SourceConfig};
pub use core::{MetadataAccessor, Row, RowOrder, RowSource, SchemaSnapshot, SqlValue, Table};
pub use drivers::{DialectImpl, MysqlReader};
pub use dump::{sql_escape, InsertStatement, ScriptWriter, TableDumper, TableSummary};
pub use error::{DumpError, Result};
pub use orchestrator::{dump_to_file, DumpResult, HealthCheckResult, Orchestrator};
pub use resolve::{CyclePolicy, DependencyResolver};
