//! Single-table transfer: map the schema, create the destination table, then
//! coerce and write every record in batches.
//!
//! A coercion failure aborts the table with the table, column and record
//! number attached. Batches written before the failure stay committed.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::coerce::{coerce, FloatPolicy};
use crate::core::schema::{FieldDescriptor, TableSchema};
use crate::core::traits::{TableReader, TargetWriter};
use crate::core::value::Batch;
use crate::error::{MigrateError, Result};
use crate::typemap::{map_field, ColumnMapping};

/// Settings for the transfer engine.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Rows per destination transaction.
    pub batch_size: usize,

    /// How Float columns are coerced.
    pub float_policy: FloatPolicy,

    /// Leave records carrying the deletion marker out of the destination.
    pub skip_deleted: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            float_policy: FloatPolicy::default(),
            skip_deleted: false,
        }
    }
}

/// Statistics from a table transfer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferStats {
    /// Rows written to the destination.
    pub rows: u64,

    /// Text fields stored through the escaping fallback.
    pub escaped_fields: u64,

    /// Deleted records left out.
    pub skipped_deleted: u64,

    /// Batches committed.
    pub batches: u64,

    /// Time spent reading and coercing.
    #[serde(skip)]
    pub read_time: Duration,

    /// Time spent writing.
    #[serde(skip)]
    pub write_time: Duration,
}

/// Map every column of a legacy table.
///
/// The first column with an unsupported type code aborts the mapping.
pub fn map_columns(table: &str, fields: &[FieldDescriptor]) -> Result<Vec<ColumnMapping>> {
    fields
        .iter()
        .map(|field| {
            map_field(field).map_err(|e| MigrateError::UnsupportedFieldType {
                table: table.to_string(),
                column: field.name.clone(),
                kind: e.0,
            })
        })
        .collect()
}

/// Build the destination table definition for a legacy table.
pub fn map_schema(table: &str, fields: &[FieldDescriptor]) -> Result<TableSchema> {
    let columns = map_columns(table, fields)?;
    for mapping in &columns {
        if let Some(warning) = &mapping.warning {
            debug!("{}.{}: {}", table, mapping.name, warning);
        }
    }

    Ok(TableSchema {
        name: table.to_string(),
        columns: columns.into_iter().map(ColumnMapping::into_column).collect(),
    })
}

/// Converts one table at a time from a reader into a writer.
#[derive(Debug, Clone, Default)]
pub struct TransferEngine {
    config: TransferConfig,
}

impl TransferEngine {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Convert one table.
    pub fn execute(
        &self,
        reader: &mut dyn TableReader,
        writer: &mut dyn TargetWriter,
    ) -> Result<TransferStats> {
        let table_name = reader.name().to_string();
        info!(
            "Starting transfer for {} ({} records declared, {} columns)",
            table_name,
            reader.row_count(),
            reader.fields().len()
        );

        let schema = map_schema(&table_name, reader.fields())?;
        writer.create_table(&schema)?;

        let columns = schema.column_names();
        let batch_size = self.config.batch_size.max(1);
        let mut stats = TransferStats::default();
        let mut batch = Batch::with_capacity(batch_size);
        let mut read_start = Instant::now();

        for record in reader.records() {
            let record = record?;
            if record.deleted && self.config.skip_deleted {
                stats.skipped_deleted += 1;
                continue;
            }
            if record.values.len() != schema.columns.len() {
                return Err(MigrateError::malformed(
                    &table_name,
                    format!(
                        "record {} has {} values for {} columns",
                        record.number,
                        record.values.len(),
                        schema.columns.len()
                    ),
                ));
            }

            let mut row = Vec::with_capacity(columns.len());
            for (raw, column) in record.values.iter().zip(&schema.columns) {
                let coerced = coerce(raw, &column.target_type, self.config.float_policy)
                    .map_err(|e| {
                        MigrateError::coerce(&table_name, &column.name, record.number, e)
                    })?;
                if coerced.escaped {
                    stats.escaped_fields += 1;
                    debug!(
                        "{}.{} record {}: stored escaped text for undecodable bytes",
                        table_name, column.name, record.number
                    );
                }
                row.push(coerced.value.into_owned());
            }
            batch.push(row);

            if batch.len() >= batch_size {
                stats.read_time += read_start.elapsed();
                self.flush(writer, &table_name, &columns, &mut batch, &mut stats)?;
                read_start = Instant::now();
            }
        }
        stats.read_time += read_start.elapsed();

        if !batch.is_empty() {
            self.flush(writer, &table_name, &columns, &mut batch, &mut stats)?;
        }

        let target_rows = writer.row_count(&table_name)?;
        if target_rows != stats.rows as i64 {
            warn!(
                "{}: destination holds {} rows but {} were written",
                table_name, target_rows, stats.rows
            );
        }

        info!(
            "{}: transferred {} rows in {} batches ({} escaped fields, {} deleted records skipped)",
            table_name, stats.rows, stats.batches, stats.escaped_fields, stats.skipped_deleted
        );
        Ok(stats)
    }

    fn flush(
        &self,
        writer: &mut dyn TargetWriter,
        table: &str,
        columns: &[String],
        batch: &mut Batch,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let write_start = Instant::now();
        let written = writer.write_batch(table, columns, batch.take())?;
        stats.write_time += write_start.elapsed();
        stats.rows += written;
        stats.batches += 1;
        debug!("{}: committed batch of {} rows ({} total)", table, written, stats.rows);
        Ok(())
    }
}
