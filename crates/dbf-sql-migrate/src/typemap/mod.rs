//! Type mapping from legacy dBase/FoxPro field types to relational types.
//!
//! Rules, in order:
//! 1. `N` with a non-zero decimal count maps to [`TargetType::Float`]
//! 2. `C` maps to a `VARCHAR` bounded by the declared length
//! 3. everything else goes through a fixed lookup table; an unknown code is
//!    an [`UnsupportedFieldType`] error and aborts the whole run

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::schema::{Column, FieldDescriptor, FieldType};

/// Relational column type chosen for a legacy column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Integer,
    Float,
    /// Character data, optionally bounded to a maximum length.
    String(Option<u16>),
    /// Logical stored as 0.0/1.0.
    Boolean,
    DateTime,
}

impl TargetType {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TargetType::Integer => "integer",
            TargetType::Float => "float",
            TargetType::String(_) => "string",
            TargetType::Boolean => "boolean",
            TargetType::DateTime => "datetime",
        }
    }
}

/// SQLite DDL rendering.
///
/// Boolean columns are declared `FLOAT` because their values are written as
/// 0.0/1.0.
impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Integer => f.write_str("INTEGER"),
            TargetType::Float | TargetType::Boolean => f.write_str("FLOAT"),
            TargetType::String(Some(len)) => write!(f, "VARCHAR({})", len),
            TargetType::String(None) => f.write_str("VARCHAR"),
            TargetType::DateTime => f.write_str("DATETIME"),
        }
    }
}

/// Type codes with a fixed target, consulted after the `N`/`C` rules.
static FIXED_TYPES: &[(char, TargetType)] = &[
    ('M', TargetType::String(None)),
    ('N', TargetType::Integer),
    ('T', TargetType::DateTime),
    ('L', TargetType::Boolean),
];

/// A legacy type code with no mapping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported field type '{0}'")]
pub struct UnsupportedFieldType(pub char);

/// Result of mapping a type from source to target.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapping {
    /// Target type.
    pub target_type: TargetType,
    /// Whether this mapping loses data or precision.
    pub is_lossy: bool,
    /// Warning message for lossy mappings.
    pub warning: Option<String>,
}

impl TypeMapping {
    /// Create a lossless type mapping.
    pub fn lossless(target_type: TargetType) -> Self {
        Self {
            target_type,
            is_lossy: false,
            warning: None,
        }
    }

    /// Create a lossy type mapping with a warning.
    pub fn lossy(target_type: TargetType, warning: impl Into<String>) -> Self {
        Self {
            target_type,
            is_lossy: true,
            warning: Some(warning.into()),
        }
    }
}

/// Result of mapping a column from source to target.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    /// Target column name (same as source).
    pub name: String,
    /// Target type.
    pub target_type: TargetType,
    /// Whether the column is nullable.
    pub is_nullable: bool,
    /// Warning message if the mapping is lossy.
    pub warning: Option<String>,
}

impl ColumnMapping {
    pub fn into_column(self) -> Column {
        Column {
            name: self.name,
            target_type: self.target_type,
            is_nullable: self.is_nullable,
        }
    }
}

/// Map a legacy field type to its relational target type.
pub fn map_type(field_type: &FieldType) -> Result<TypeMapping, UnsupportedFieldType> {
    let FieldType {
        kind,
        length,
        decimal_count,
    } = *field_type;

    if kind == 'N' && decimal_count != 0 {
        return Ok(TypeMapping::lossy(
            TargetType::Float,
            format!(
                "numeric({},{}) stored as floating point; precision beyond f64 is lost",
                length, decimal_count
            ),
        ));
    }

    if kind == 'C' {
        return Ok(TypeMapping::lossless(TargetType::String(Some(length))));
    }

    FIXED_TYPES
        .iter()
        .find(|(code, _)| *code == kind)
        .map(|(_, target)| TypeMapping::lossless(*target))
        .ok_or(UnsupportedFieldType(kind))
}

/// Map a legacy column definition.
///
/// Legacy columns accept blanks, which arrive as NULL, so every destination
/// column is nullable.
pub fn map_field(field: &FieldDescriptor) -> Result<ColumnMapping, UnsupportedFieldType> {
    let mapping = map_type(&field.field_type)?;
    Ok(ColumnMapping {
        name: field.name.clone(),
        target_type: mapping.target_type,
        is_nullable: true,
        warning: mapping.warning,
    })
}
