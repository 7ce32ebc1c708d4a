//! Legacy table discovery and reading.

mod dbf;
mod memo;

pub use dbf::{DbfHeader, DbfTable};
pub use memo::{find_memo_file, MemoFile, MemoFormat};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{MigrateError, Result};

/// A legacy table file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Destination table name, the file stem with its case preserved.
    pub table_name: String,
}

impl SourceFile {
    pub fn open(&self) -> Result<DbfTable> {
        DbfTable::open(&self.path)
    }
}

/// List the table files in `dir` whose extension matches `extension`
/// (case-insensitive), sorted by table name.
///
/// Two files that would create the same table (`a.dbf` and `A.DBF`) are a
/// configuration error since SQLite table names are case-insensitive.
pub fn discover_tables(dir: &Path, extension: &str) -> Result<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(MigrateError::Config(format!(
            "source directory {} does not exist or is not a directory",
            dir.display()
        )));
    }

    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => files.push(SourceFile {
                table_name: stem.to_string(),
                path,
            }),
            _ => warn!("Skipping {}: file name is not valid UTF-8", path.display()),
        }
    }

    files.sort_by(|a, b| a.table_name.cmp(&b.table_name));

    let mut seen: HashMap<String, &Path> = HashMap::new();
    for file in &files {
        if let Some(previous) = seen.insert(file.table_name.to_lowercase(), &file.path) {
            return Err(MigrateError::Config(format!(
                "{} and {} map to the same table name",
                previous.display(),
                file.path.display()
            )));
        }
    }

    debug!("Found {} .{} files in {}", files.len(), extension, dir.display());
    Ok(files)
}
