//! Core abstractions shared by the reader, the coercer and the writer.
//!
//! - [`schema`]: legacy field descriptors and destination table definitions
//! - [`value`]: raw legacy values and coerced SQL values
//! - [`traits`]: the reader and writer seams
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{Column, FieldDescriptor, FieldType, TableSchema};
pub use traits::{Record, Records, TableReader, TargetWriter};
pub use value::{Batch, RawValue, SqlValue};
