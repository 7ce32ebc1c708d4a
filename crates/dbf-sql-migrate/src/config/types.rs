//! Configuration type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::coerce::FloatPolicy;
use crate::transfer::TransferConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Legacy table files.
    pub source: SourceConfig,

    /// Destination database.
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

impl Config {
    /// Build a configuration from the two required paths, everything else
    /// at its default.
    pub fn new(source_dir: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source: SourceConfig {
                dir: source_dir.into(),
                extension: default_extension(),
                skip_deleted: false,
            },
            target: TargetConfig {
                path: target_path.into(),
                overwrite: true,
            },
            migration: MigrationConfig::default(),
        }
    }

    /// Transfer engine settings derived from this configuration.
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            batch_size: self.migration.batch_size,
            float_policy: self.migration.float_policy,
            skip_deleted: self.source.skip_deleted,
        }
    }
}

/// Source directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the table files (not searched recursively).
    pub dir: PathBuf,

    /// Table file extension, matched case-insensitively (default: "dbf").
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Leave records marked deleted out of the destination (default: false).
    #[serde(default)]
    pub skip_deleted: bool,
}

/// Destination database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// SQLite database file.
    pub path: PathBuf,

    /// Delete an existing database file before the run (default: true).
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per destination transaction (default: 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Coercion of Float columns (default: parse).
    #[serde(default)]
    pub float_policy: FloatPolicy,

    /// Tables to include (glob patterns). Empty means all.
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Tables to exclude (glob patterns).
    #[serde(default)]
    pub exclude_tables: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            float_policy: FloatPolicy::default(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
        }
    }
}

fn default_extension() -> String {
    "dbf".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}
