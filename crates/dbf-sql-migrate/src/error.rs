//! Error types for the conversion library.

use thiserror::Error;

use crate::coerce::CoerceError;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, duplicate tables, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A legacy column uses a type code the type mapper has no rule for.
    #[error("Unsupported field type '{kind}' for column {column} in table {table}")]
    UnsupportedFieldType {
        table: String,
        column: String,
        kind: char,
    },

    /// A field value could not be coerced to its column's target type.
    #[error("Table {table}, column {column}, record {row}: {source}")]
    Coerce {
        table: String,
        column: String,
        row: u64,
        #[source]
        source: CoerceError,
    },

    /// The legacy table file is malformed or truncated.
    #[error("Source file {path}: {message}")]
    Source { path: String, message: String },

    /// Destination database error
    #[error("Target database error: {0}")]
    Target(#[from] rusqlite::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Source error for a malformed legacy file.
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Source {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attach table/column/record context to a coercion failure.
    pub fn coerce(
        table: impl Into<String>,
        column: impl Into<String>,
        row: u64,
        source: CoerceError,
    ) -> Self {
        MigrateError::Coerce {
            table: table.into(),
            column: column.into(),
            row,
            source,
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => 1,
            MigrateError::UnsupportedFieldType { .. } => 2,
            MigrateError::Coerce { .. } => 3,
            MigrateError::Source { .. } => 4,
            MigrateError::Target(_) => 5,
            MigrateError::Io(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), 1);
        let unsupported = MigrateError::UnsupportedFieldType {
            table: "T".into(),
            column: "C".into(),
            kind: 'Q',
        };
        assert_eq!(unsupported.exit_code(), 2);
        let io = MigrateError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.exit_code(), 7);
    }

    #[test]
    fn test_coerce_error_carries_location() {
        let err = MigrateError::coerce(
            "CLIENTS",
            "ID",
            17,
            CoerceError::Conversion {
                value: "'abc'".into(),
                target: "integer",
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("CLIENTS"));
        assert!(msg.contains("ID"));
        assert!(msg.contains("17"));

        let detailed = err.format_detailed();
        assert!(detailed.contains("Caused by"));
        assert!(detailed.contains("integer"));
    }
}
