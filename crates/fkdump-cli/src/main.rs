//! fkdump CLI - dump a table together with its foreign-key parents.

use clap::{Parser, Subcommand};
use dialoguer::Input;
use fkdump::{Config, DumpError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "fkdump")]
#[command(about = "Dump a MySQL table and every table it references as replayable SQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump a table and its foreign-key parents to a SQL file
    Dump {
        /// Table to start from (prompted for when omitted)
        #[arg(short, long)]
        table: Option<String>,

        /// Output file [default: <output_dir>/<table>_recursive_dump.sql]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override rows per INSERT statement
        #[arg(long)]
        batch_size: Option<usize>,

        /// Override output dialect: mysql or postgres
        #[arg(long)]
        dialect: Option<String>,
    },

    /// Show the tables a dump would include, parents first
    Plan {
        /// Table to start from (prompted for when omitted)
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Test the source database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DumpError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(DumpError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Dump {
            table,
            output,
            batch_size,
            dialect,
        } => {
            if let Some(n) = batch_size {
                config.dump.batch_size = n;
            }
            if let Some(d) = dialect {
                config.dump.dialect = d;
            }
            config.validate()?;

            let table = start_table(table)?;
            let cancel_token = setup_signal_handler()?;

            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator
                .run(&table, output.as_deref(), &cancel_token)
                .await;
            orchestrator.close().await;
            let result = result?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nDump completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Tables (parent tables first):");
                for t in &result.tables {
                    println!("   - {} ({} rows)", t.name, t.rows);
                }
                println!("  Rows: {}", result.rows_total);
                println!("  Dump written to: {}", result.output.display());
            }
        }

        Commands::Plan { table } => {
            let table = start_table(table)?;

            let orchestrator = Orchestrator::new(config).await?;
            let tables = orchestrator.plan(&table).await;
            orchestrator.close().await;
            let tables = tables?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                println!("Tables included in dump (parent tables first):");
                for t in &tables {
                    println!(" - {}", t);
                }
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.health_check().await;
            orchestrator.close().await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MySQL {}): {} ({}ms)",
                    result.database,
                    if result.healthy { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if !result.healthy {
                return Err(DumpError::pool(
                    result.error.unwrap_or_default(),
                    "health check",
                ));
            }
        }
    }

    Ok(())
}

/// Use the table given on the command line, or ask for one.
fn start_table(arg: Option<String>) -> Result<String, DumpError> {
    let table = match arg {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("Enter table name to dump")
            .interact_text()
            .map_err(|e| DumpError::Config(format!("Failed to read table name: {}", e)))?,
    };

    let table = table.trim().to_string();
    if table.is_empty() {
        return Err(DumpError::Config("A table name is required".to_string()));
    }
    Ok(table)
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Unknown verbosity: '{}'", other)),
    };

    // Logs go to stderr so stdout stays clean for --output-json
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("Unknown log format: '{}'", other)),
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> Result<CancellationToken, DumpError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!("\nReceived {}. Stopping dump and removing partial output...", name);
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> Result<CancellationToken, DumpError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping dump and removing partial output...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
