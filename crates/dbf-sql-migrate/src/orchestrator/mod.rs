//! Migration orchestrator - main workflow coordinator.
//!
//! A run goes through three phases:
//!
//! 1. discover the table files in the source directory and apply the table
//!    filters
//! 2. open the destination database, deleting an existing file when
//!    overwriting
//! 3. convert the tables one after another
//!
//! The first error aborts the run. Tables converted before it stay in the
//! destination.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::traits::{TableReader, TargetWriter};
use crate::error::{MigrateError, Result};
use crate::source::{discover_tables, SourceFile};
use crate::target::SqliteWriter;
use crate::transfer::{map_columns, TransferEngine};

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Destination database file.
    pub target_path: PathBuf,

    /// Total tables selected for conversion.
    pub tables_total: usize,

    /// Tables successfully converted.
    pub tables_success: usize,

    /// Total rows transferred.
    pub rows_transferred: u64,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,

    /// Text fields stored through the escaping fallback, across all tables.
    pub escaped_fields: u64,

    /// Per-table results in conversion order.
    pub tables: Vec<TableResult>,
}

/// Outcome of one converted table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableResult {
    pub name: String,
    pub source_path: PathBuf,
    pub rows: u64,
    pub escaped_fields: u64,
    pub skipped_deleted: u64,
    pub duration_seconds: f64,
}

/// What a run would do, without writing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub source_dir: PathBuf,
    pub target_path: PathBuf,
    pub tables: Vec<TablePlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePlan {
    pub name: String,
    pub source_path: PathBuf,
    /// Record count declared in the file header (deleted records included).
    pub declared_rows: u64,
    /// Last update date stamped in the file header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<NaiveDate>,
    pub columns: Vec<ColumnPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPlan {
    pub name: String,
    /// Legacy type, e.g. `N(10,2)`.
    pub source_type: String,
    /// Destination DDL type, e.g. `FLOAT`.
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover the table files and apply the include/exclude filters.
    fn select_tables(&self) -> Result<Vec<SourceFile>> {
        let filter = self.config.migration.table_filter()?;
        let files = discover_tables(&self.config.source.dir, &self.config.source.extension)?;
        let total = files.len();
        let selected: Vec<SourceFile> = files
            .into_iter()
            .filter(|f| {
                let keep = filter.is_selected(&f.table_name);
                if !keep {
                    debug!("Skipping table {} (filtered)", f.table_name);
                }
                keep
            })
            .collect();

        if selected.len() < total {
            info!(
                "Selected {} of {} tables after filtering",
                selected.len(),
                total
            );
        }
        Ok(selected)
    }

    /// Map every selected table's schema without touching the destination.
    ///
    /// Fails like a real run would on an unsupported type code or a malformed
    /// header.
    pub fn plan(&self) -> Result<MigrationPlan> {
        let mut tables = Vec::new();
        for file in self.select_tables()? {
            let table = file.open()?;
            let mappings = map_columns(table.name(), table.fields())?;
            let columns = table
                .fields()
                .iter()
                .zip(mappings)
                .map(|(field, mapping)| ColumnPlan {
                    name: mapping.name,
                    source_type: field.field_type.to_string(),
                    target_type: mapping.target_type.to_string(),
                    warning: mapping.warning,
                })
                .collect();

            tables.push(TablePlan {
                name: file.table_name.clone(),
                source_path: file.path.clone(),
                declared_rows: table.row_count(),
                last_update: table.header().last_update,
                columns,
            });
        }

        Ok(MigrationPlan {
            source_dir: self.config.source.dir.clone(),
            target_path: self.config.target.path.clone(),
            tables,
        })
    }

    /// Run the migration.
    pub fn run(self) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting migration run: {}", run_id);

        // Phase 1: Discover tables
        info!(
            "Phase 1: Discovering .{} files in {}",
            self.config.source.extension.trim_start_matches('.'),
            self.config.source.dir.display()
        );
        let files = self.select_tables()?;
        if files.is_empty() {
            warn!("No table files found in {}", self.config.source.dir.display());
        } else {
            info!("Found {} tables to migrate", files.len());
        }

        // Phase 2: Prepare target
        info!(
            "Phase 2: Preparing target database {} (overwrite: {})",
            self.config.target.path.display(),
            self.config.target.overwrite
        );
        let mut writer = SqliteWriter::create(&self.config.target.path, self.config.target.overwrite)?;
        if !self.config.target.overwrite {
            for file in &files {
                if writer.table_exists(&file.table_name)? {
                    return Err(MigrateError::Config(format!(
                        "table {} already exists in {}",
                        file.table_name,
                        self.config.target.path.display()
                    )));
                }
            }
        }

        // Phase 3: Transfer data
        info!("Phase 3: Transferring data");
        let engine = TransferEngine::new(self.config.transfer_config());
        let mut tables = Vec::with_capacity(files.len());
        for file in &files {
            let table_start = Instant::now();
            let mut table = file.open()?;
            let stats = engine.execute(&mut table, &mut writer)?;
            tables.push(TableResult {
                name: file.table_name.clone(),
                source_path: file.path.clone(),
                rows: stats.rows,
                escaped_fields: stats.escaped_fields,
                skipped_deleted: stats.skipped_deleted,
                duration_seconds: table_start.elapsed().as_secs_f64(),
            });
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let rows_transferred: u64 = tables.iter().map(|t| t.rows).sum();
        let escaped_fields: u64 = tables.iter().map(|t| t.escaped_fields).sum();
        let rows_per_second = if duration > 0.0 {
            (rows_transferred as f64 / duration) as u64
        } else {
            0
        };

        info!(
            "Migration {} completed: {} tables, {} rows in {:.2}s ({} rows/s)",
            run_id,
            tables.len(),
            rows_transferred,
            duration,
            rows_per_second
        );
        if escaped_fields > 0 {
            warn!(
                "{} text fields were not valid UTF-8 and were stored escaped",
                escaped_fields
            );
        }

        Ok(MigrationResult {
            run_id,
            status: "completed".to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            target_path: self.config.target.path.clone(),
            tables_total: files.len(),
            tables_success: tables.len(),
            rows_transferred,
            rows_per_second,
            escaped_fields,
            tables,
        })
    }
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl MigrationPlan {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} -> {} ({} tables)",
            self.source_dir.display(),
            self.target_path.display(),
            self.tables.len()
        )?;
        for table in &self.tables {
            writeln!(f)?;
            write!(f, "{} ({} records)", table.name, table.declared_rows)?;
            if let Some(date) = table.last_update {
                write!(f, ", last updated {}", date)?;
            }
            writeln!(f)?;
            for column in &table.columns {
                write!(
                    f,
                    "  {:<12} {:<8} -> {}",
                    column.name, column.source_type, column.target_type
                )?;
                if let Some(warning) = &column.warning {
                    write!(f, "  [{}]", warning)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
