//! Dump orchestrator - main workflow coordinator.
//!
//! One run loads a schema snapshot, resolves the dependency order of the
//! start table and writes the script to `<output>.partial`, renaming it into
//! place only when every table was dumped.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::BufWriter;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, DumpConfig};
use crate::core::traits::{MetadataAccessor, RowSource};
use crate::drivers::{DialectImpl, MysqlReader};
use crate::dump::{ScriptWriter, TableDumper, TableSummary};
use crate::error::Result;
use crate::resolve::DependencyResolver;

/// Source connections; tables are dumped one at a time.
const SOURCE_CONNECTIONS: u32 = 2;

/// Dump orchestrator.
pub struct Orchestrator {
    config: Config,
    reader: MysqlReader,
}

/// Result of a dump run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Table the dump started from.
    pub start_table: String,

    /// Final status.
    pub status: String,

    /// Path of the written script.
    pub output: PathBuf,

    /// Tables in dump order with their row and statement counts.
    pub tables: Vec<TableSummary>,

    /// Total rows dumped.
    pub rows_total: u64,

    /// Total INSERT statements written.
    pub statements_total: u64,

    /// Size of the script in bytes.
    pub bytes_written: u64,

    /// When the dump started.
    pub started_at: DateTime<Utc>,

    /// When the dump completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl DumpResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a source connection check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Whether `SELECT 1` succeeded.
    pub healthy: bool,

    /// Database the reader is connected to.
    pub database: String,

    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,

    /// Error message when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthCheckResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Create a new orchestrator and connect to the source.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let reader =
            MysqlReader::new(&config.source, SOURCE_CONNECTIONS, config.dump.batch_size).await?;
        Ok(Self { config, reader })
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the dump order for `start_table` without dumping rows.
    pub async fn plan(&self, start_table: &str) -> Result<Vec<String>> {
        let snapshot = self.reader.load_snapshot().await?;
        self.resolver().resolve(start_table, &snapshot)
    }

    /// Dump `start_table` and all of its foreign-key parents.
    ///
    /// Writes to `output`, or to the configured output directory when
    /// `None`.
    pub async fn run(
        &self,
        start_table: &str,
        output: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<DumpResult> {
        info!("Resolving dependencies of {}", start_table);
        let snapshot = self.reader.load_snapshot().await?;
        let tables = self.resolver().resolve(start_table, &snapshot)?;
        info!("Tables included in dump (parent tables first): {}", tables.join(", "));

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.dump.output_path(start_table));

        dump_to_file(
            &output,
            start_table,
            &tables,
            &snapshot,
            &self.reader,
            &self.config.dump,
            cancel,
        )
        .await
    }

    /// Test the source connection.
    pub async fn health_check(&self) -> HealthCheckResult {
        match self.reader.health_check().await {
            Ok(latency) => HealthCheckResult {
                healthy: true,
                database: self.reader.database().to_string(),
                latency_ms: latency.as_millis() as u64,
                error: None,
            },
            Err(e) => HealthCheckResult {
                healthy: false,
                database: self.reader.database().to_string(),
                latency_ms: 0,
                error: Some(e.to_string()),
            },
        }
    }

    /// Close the source connection pool.
    pub async fn close(&self) {
        self.reader.close().await;
    }

    fn resolver(&self) -> DependencyResolver {
        DependencyResolver::new().with_cycle_policy(self.config.dump.on_cycle)
    }
}

/// Write the dump script for `tables` (in dependency order) to `output`.
///
/// The script is written to `<output>.partial` and renamed on success. On
/// any error, including cancellation, the partial file is removed and no
/// file is left at `output`.
pub async fn dump_to_file<M, S>(
    output: &Path,
    start_table: &str,
    tables: &[String],
    metadata: &M,
    source: &S,
    settings: &DumpConfig,
    cancel: &CancellationToken,
) -> Result<DumpResult>
where
    M: MetadataAccessor + ?Sized,
    S: RowSource + ?Sized,
{
    let started_at = Utc::now();
    let timer = Instant::now();
    let run_id = uuid::Uuid::new_v4().to_string();
    info!("Starting dump run {} into {}", run_id, output.display());

    let dumper = TableDumper::new(DialectImpl::from_db_type(&settings.dialect)?)
        .with_batch_size(settings.batch_size);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = partial_path(output);

    let written = write_script(
        &partial,
        dumper,
        settings,
        start_table,
        tables,
        metadata,
        source,
        cancel,
    )
    .await;
    let (summaries, bytes_written) = match written {
        Ok(written) => written,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&partial).await {
                warn!("Could not remove {}: {}", partial.display(), rm);
            }
            return Err(e);
        }
    };
    tokio::fs::rename(&partial, output).await?;

    let rows_total = summaries.iter().map(|t| t.rows).sum();
    let statements_total = summaries.iter().map(|t| t.statements).sum();
    let result = DumpResult {
        run_id,
        start_table: start_table.to_string(),
        status: "completed".to_string(),
        output: output.to_path_buf(),
        tables: summaries,
        rows_total,
        statements_total,
        bytes_written,
        started_at,
        completed_at: Utc::now(),
        duration_seconds: timer.elapsed().as_secs_f64(),
    };

    info!(
        "Dump {}: {} tables, {} rows in {:.1}s, written to {}",
        result.status,
        result.tables.len(),
        result.rows_total,
        result.duration_seconds,
        result.output.display()
    );
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
async fn write_script<M, S>(
    path: &Path,
    dumper: TableDumper,
    settings: &DumpConfig,
    start_table: &str,
    tables: &[String],
    metadata: &M,
    source: &S,
    cancel: &CancellationToken,
) -> Result<(Vec<TableSummary>, u64)>
where
    M: MetadataAccessor + ?Sized,
    S: RowSource + ?Sized,
{
    let file = tokio::fs::File::create(path).await?;
    let mut writer = ScriptWriter::new(BufWriter::new(file), dumper)
        .with_comments(settings.comments)
        .with_delete_existing(settings.delete_existing);

    let summaries = writer
        .write_dump(start_table, tables, metadata, source, cancel)
        .await?;
    let bytes_written = writer.bytes_written();
    let file = writer.finish().await?.into_inner();
    file.sync_all().await?;

    Ok((summaries, bytes_written))
}

/// `<output>.partial`
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
