//! Identifier validation and quoting for generated SQL.
//!
//! Table and column names come from legacy file names and headers, so they
//! cannot be bound as parameters. They are validated and quoted instead.

use crate::error::{MigrateError, Result};

/// Maximum identifier length accepted for destination tables and columns.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a SQLite identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_sqlite("users")?, "\"users\"");
/// assert_eq!(quote_sqlite("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_sqlite(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_sqlite() {
        assert_eq!(quote_sqlite("users").unwrap(), "\"users\"");
        assert_eq!(quote_sqlite("table\"name").unwrap(), "\"table\"\"name\"");
        assert_eq!(quote_sqlite("with space").unwrap(), "\"with space\"");
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(quote_sqlite("").is_err());
        assert!(quote_sqlite("bad\0name").is_err());
        assert!(quote_sqlite(&"x".repeat(129)).is_err());
        assert!(quote_sqlite(&"x".repeat(128)).is_ok());
    }
}
