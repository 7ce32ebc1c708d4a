//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.dir.as_os_str().is_empty() {
        return Err(MigrateError::Config("source.dir is required".into()));
    }
    let extension = config.source.extension.trim_start_matches('.');
    if extension.is_empty() || extension.contains(['/', '\\']) {
        return Err(MigrateError::Config(format!(
            "source.extension '{}' is not a file extension",
            config.source.extension
        )));
    }

    if config.target.path.as_os_str().is_empty() {
        return Err(MigrateError::Config("target.path is required".into()));
    }
    if config.target.path.is_dir() {
        return Err(MigrateError::Config(format!(
            "target.path {} is a directory",
            config.target.path.display()
        )));
    }

    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }
    for pattern in config
        .migration
        .include_tables
        .iter()
        .chain(&config.migration.exclude_tables)
    {
        if pattern.trim().is_empty() {
            return Err(MigrateError::Config(
                "table filter patterns cannot be empty".into(),
            ));
        }
    }
    config.migration.table_filter()?;

    Ok(())
}
