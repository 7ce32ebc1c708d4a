//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl MigrationConfig {
    /// Compile the include/exclude patterns.
    ///
    /// Patterns are case-insensitive globs (`*`, `?`, `[abc]`, `{a,b}`).
    pub fn table_filter(&self) -> Result<TableFilter> {
        let include = if self.include_tables.is_empty() {
            None
        } else {
            Some(glob_set(&self.include_tables)?)
        };
        Ok(TableFilter {
            include,
            exclude: glob_set(&self.exclude_tables)?,
        })
    }
}

/// Compiled table selection filters.
///
/// An empty include list includes every table; exclusion wins over inclusion.
#[derive(Debug, Clone)]
pub struct TableFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl TableFilter {
    /// Whether a table passes the include/exclude filters.
    pub fn is_selected(&self, table: &str) -> bool {
        let included = self.include.as_ref().map_or(true, |set| set.is_match(table));
        included && !self.exclude.is_match(table)
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| MigrateError::Config(format!("invalid table pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| MigrateError::Config(format!("invalid table patterns: {}", e)))
}
