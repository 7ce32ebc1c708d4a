//! Schema types for legacy tables and their relational counterparts.
//!
//! A legacy table is described by [`FieldDescriptor`]s as read from the file
//! header. After type mapping, the destination table is described by a
//! [`TableSchema`] whose [`Column`]s carry exactly one [`TargetType`] each for
//! the whole conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::typemap::TargetType;

/// Visual FoxPro field flag: hidden system column (e.g. `_NullFlags`).
pub const FIELD_FLAG_SYSTEM: u8 = 0x01;

/// Visual FoxPro field flag: column accepts NULL.
pub const FIELD_FLAG_NULLABLE: u8 = 0x02;

/// Legacy column type descriptor: kind code, declared length and decimal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    /// One-character type code (`C`, `N`, `L`, `T`, `M`, ...).
    pub kind: char,

    /// Declared width in bytes.
    pub length: u16,

    /// Digits after the decimal point (numeric columns only).
    pub decimal_count: u8,
}

impl FieldType {
    pub fn new(kind: char, length: u16, decimal_count: u8) -> Self {
        Self {
            kind,
            length,
            decimal_count,
        }
    }
}

/// Renders as `N(10,2)`, or `C(20)` when there are no decimals.
impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimal_count == 0 {
            write!(f, "{}({})", self.kind, self.length)
        } else {
            write!(f, "{}({},{})", self.kind, self.length, self.decimal_count)
        }
    }
}

/// One column of a legacy table as declared in its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name.
    pub name: String,

    /// Declared type.
    pub field_type: FieldType,

    /// Raw Visual FoxPro field flags (0 for dBase files).
    pub flags: u8,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            flags: 0,
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Hidden system column that must not reach the destination.
    pub fn is_system(&self) -> bool {
        self.flags & FIELD_FLAG_SYSTEM != 0
    }

    /// Column declared as nullable.
    pub fn is_nullable(&self) -> bool {
        self.flags & FIELD_FLAG_NULLABLE != 0
    }
}

/// Destination column with its mapped type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Target type used for both DDL and coercion.
    pub target_type: TargetType,

    /// Whether the column is nullable.
    pub is_nullable: bool,
}

/// Destination table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name (source file stem).
    pub name: String,

    /// Columns in source order.
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Find a column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
