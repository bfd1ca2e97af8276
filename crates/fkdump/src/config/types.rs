//! Configuration type definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dump::DEFAULT_BATCH_SIZE;
use crate::resolve::CyclePolicy;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (MySQL).
    pub source: SourceConfig,

    /// Dump behavior configuration.
    #[serde(default)]
    pub dump: DumpConfig,
}

/// Source database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "mysql" for now).
    #[serde(default = "default_mysql")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database (schema) name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password. Never serialized.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// SSL mode: disable, preferred or required (default: "preferred").
    #[serde(default = "default_preferred")]
    pub ssl_mode: String,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Dump behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Rows per multi-row INSERT (default: 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Dialect of the generated script: mysql or postgres (default: mysql).
    #[serde(default = "default_mysql")]
    pub dialect: String,

    /// Behavior on foreign key cycles (default: tolerate).
    #[serde(default)]
    pub on_cycle: CyclePolicy,

    /// Emit DELETE statements for every dumped table before the inserts.
    #[serde(default)]
    pub delete_existing: bool,

    /// Emit per-table header comments (default: true).
    #[serde(default = "default_true")]
    pub comments: bool,

    /// Directory for the output file (default: current directory).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dialect: default_mysql(),
            on_cycle: CyclePolicy::default(),
            delete_existing: false,
            comments: true,
            output_dir: default_output_dir(),
        }
    }
}

impl DumpConfig {
    /// Output path for a dump starting at `start_table`.
    pub fn output_path(&self, start_table: &str) -> PathBuf {
        default_output_path(&self.output_dir, start_table)
    }
}

/// `<dir>/<table>_recursive_dump.sql`
pub fn default_output_path(dir: &Path, start_table: &str) -> PathBuf {
    dir.join(format!("{}_recursive_dump.sql", start_table))
}

fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_preferred() -> String {
    "preferred".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
