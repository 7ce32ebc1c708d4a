//! Core traits at the two I/O seams of the conversion.
//!
//! - [`TableReader`]: yields the schema and records of one legacy table
//! - [`TargetWriter`]: creates tables and inserts rows in the destination store
//!
//! The transfer logic only talks to these traits, so it can be exercised with
//! in-memory implementations in tests.

use crate::error::Result;

use super::schema::{FieldDescriptor, TableSchema};
use super::value::{Batch, RawValue};

/// One legacy record with its values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based ordinal of the record in the source file.
    pub number: u64,

    /// Whether the record carries the deletion marker.
    pub deleted: bool,

    /// One value per visible field, in [`TableReader::fields`] order.
    pub values: Vec<RawValue>,
}

/// Boxed record iterator returned by [`TableReader::records`].
pub type Records<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// Read schema and records from one legacy table.
///
/// The table handle owns its file resources and releases them on drop, so an
/// aborted conversion never leaks an open file.
pub trait TableReader {
    /// Table name (the source file stem).
    fn name(&self) -> &str;

    /// Visible columns in declaration order.
    fn fields(&self) -> &[FieldDescriptor];

    /// Number of records declared in the table header.
    fn row_count(&self) -> u64;

    /// Iterate over the table's records from the start.
    fn records(&mut self) -> Records<'_>;
}

/// Write schema and rows to the destination store.
pub trait TargetWriter {
    /// Create a table from its column specs.
    fn create_table(&mut self, table: &TableSchema) -> Result<()>;

    /// Check if a table exists.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Write a batch of rows in a single transaction.
    ///
    /// Returns the number of rows written.
    fn write_batch(&mut self, table: &str, cols: &[String], batch: Batch) -> Result<u64>;

    /// Get the row count for a table.
    fn row_count(&self, table: &str) -> Result<i64>;
}
