//! Error types for the dump library.

use thiserror::Error;

/// Process exit codes reported by the CLI for each error class.
pub const EXIT_CONFIG_ERROR: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_CYCLE: u8 = 3;
pub const EXIT_UNSUPPORTED_TYPE: u8 = 4;
pub const EXIT_SOURCE_ERROR: u8 = 5;
pub const EXIT_IO_ERROR: u8 = 7;
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for dump operations.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Configuration error (invalid YAML, missing fields, bad arguments)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Start table or a referenced parent table is absent from the schema
    #[error("Table not found: {0}")]
    NotFound(String),

    /// Foreign-key cycle among the tables reachable from the start table
    #[error("Foreign key cycle detected: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// A row value that has no literal encoding
    #[error("Unsupported value type {type_name} in {table}.{column} at row {row}")]
    UnsupportedType {
        table: String,
        column: String,
        row: u64,
        type_name: &'static str,
    },

    /// Row retrieval failed while a table was being dumped
    #[error("Row source failed for table {table}: {message}")]
    SourceFailure { table: String, message: String },

    /// Connection pool or metadata query error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dump was cancelled (SIGINT, etc.)
    #[error("Dump cancelled")]
    Cancelled,
}

impl DumpError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        DumpError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a SourceFailure error
    pub fn source_failure(table: impl Into<String>, message: impl ToString) -> Self {
        DumpError::SourceFailure {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::Config(_) | DumpError::Yaml(_) | DumpError::Json(_) => EXIT_CONFIG_ERROR,
            DumpError::NotFound(_) => EXIT_NOT_FOUND,
            DumpError::CycleDetected { .. } => EXIT_CYCLE,
            DumpError::UnsupportedType { .. } => EXIT_UNSUPPORTED_TYPE,
            DumpError::SourceFailure { .. } | DumpError::Pool { .. } => EXIT_SOURCE_ERROR,
            DumpError::Io(_) => EXIT_IO_ERROR,
            DumpError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;
