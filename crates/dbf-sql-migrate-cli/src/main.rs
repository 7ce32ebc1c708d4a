//! dbf-sql-migrate CLI - convert dBase/FoxPro tables into a SQLite database.

use clap::{Parser, Subcommand};
use dbf_sql_migrate::{unescape_bytes, Config, FloatPolicy, MigrateError, Orchestrator};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "dbf-sql-migrate")]
#[command(about = "Convert dBase/FoxPro .dbf tables into a SQLite database")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

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
    /// Convert every table file in a directory into one SQLite database
    Run {
        /// Directory holding the .dbf files (overrides source.dir)
        source_dir: Option<PathBuf>,

        /// SQLite database to create (overrides target.path)
        target: Option<PathBuf>,

        /// Dry run: map the schemas and show the plan without writing
        #[arg(long)]
        dry_run: bool,

        /// Override rows per transaction
        #[arg(long)]
        batch_size: Option<usize>,

        /// Float column coercion: parse or passthrough
        #[arg(long)]
        float_policy: Option<FloatPolicy>,

        /// Override table file extension
        #[arg(long)]
        extension: Option<String>,

        /// Leave records marked deleted out of the destination
        #[arg(long)]
        skip_deleted: bool,

        /// Keep an existing destination database instead of replacing it
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Recover the original bytes of a field stored in escaped form
    Unescape {
        /// Escaped text as stored in the destination
        text: String,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    // Handle unescape separately (no logging, raw bytes on stdout)
    if let Commands::Unescape { text } = &cli.command {
        let bytes = unescape_bytes(text).map_err(|e| MigrateError::Config(e.to_string()))?;
        std::io::stdout().write_all(&bytes)?;
        return Ok(());
    }

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    match cli.command {
        Commands::Unescape { .. } => unreachable!(), // Handled above
        Commands::Run {
            source_dir,
            target,
            dry_run,
            batch_size,
            float_policy,
            extension,
            skip_deleted,
            no_overwrite,
        } => {
            let mut config = match (&cli.config, source_dir, target) {
                (Some(path), source_dir, target) => {
                    let mut config = Config::load(path)?;
                    info!("Loaded configuration from {:?}", path);
                    if let Some(dir) = source_dir {
                        config.source.dir = dir;
                    }
                    if let Some(target) = target {
                        config.target.path = target;
                    }
                    config
                }
                (None, Some(source_dir), Some(target)) => Config::new(source_dir, target),
                (None, _, _) => {
                    return Err(MigrateError::Config(
                        "SOURCE_DIR and TARGET are required unless --config is given".to_string(),
                    ))
                }
            };

            // Apply overrides
            if let Some(size) = batch_size {
                config.migration.batch_size = size;
            }
            if let Some(policy) = float_policy {
                config.migration.float_policy = policy;
            }
            if let Some(ext) = extension {
                config.source.extension = ext;
            }
            if skip_deleted {
                config.source.skip_deleted = true;
            }
            if no_overwrite {
                config.target.overwrite = false;
            }

            let orchestrator = Orchestrator::new(config)?;

            if dry_run {
                let plan = orchestrator.plan()?;
                if cli.output_json {
                    println!("{}", plan.to_json()?);
                } else {
                    print!("{}", plan);
                }
                return Ok(());
            }

            let result = orchestrator.run()?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!(
                    "  Tables: {}/{}",
                    result.tables_success, result.tables_total
                );
                println!("  Rows: {}", result.rows_transferred);
                println!("  Throughput: {} rows/sec", result.rows_per_second);
                if result.escaped_fields > 0 {
                    println!("  Escaped fields: {}", result.escaped_fields);
                }
                for table in &result.tables {
                    println!("    {}: {} rows", table.name, table.rows);
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
