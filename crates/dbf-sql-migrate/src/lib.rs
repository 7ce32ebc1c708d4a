//! # dbf-sql-migrate
//!
//! Conversion of legacy dBase / FoxPro table files into a SQLite database.
//!
//! Each `.dbf` file in a directory becomes one destination table named after
//! the file. The library provides:
//!
//! - **Type mapping** from legacy column types to relational types
//! - **Record coercion** of each field to its column's type, with a lossless
//!   escaping fallback for bytes that are not valid UTF-8
//! - **A `.dbf` reader** covering dBase III/IV, FoxPro and Visual FoxPro
//!   tables with `.fpt`/`.dbt` memo files
//! - **Batched writes** into SQLite, one transaction per batch
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbf_sql_migrate::{Config, Orchestrator};
//!
//! fn main() -> dbf_sql_migrate::Result<()> {
//!     let config = Config::new("legacy/", "converted.db");
//!     let result = Orchestrator::new(config)?.run()?;
//!     println!("Converted {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod coerce;
pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod target;
pub mod transfer;
pub mod typemap;

// Re-exports for convenient access
pub use coerce::{coerce, decode_text, escape_bytes, unescape_bytes, Coerced, FloatPolicy};
pub use config::{Config, MigrationConfig, SourceConfig, TableFilter, TargetConfig};
pub use crate::core::{Batch, FieldDescriptor, FieldType, RawValue, SqlValue, TableReader, TargetWriter};
pub use error::{MigrateError, Result};
pub use orchestrator::{MigrationPlan, MigrationResult, Orchestrator, TableResult};
pub use source::{discover_tables, DbfTable, SourceFile};
pub use target::SqliteWriter;
pub use transfer::{TransferConfig, TransferEngine, TransferStats};
pub use typemap::{map_field, map_type, TargetType};
