//! Destination database operations.

mod sqlite;

pub use sqlite::SqliteWriter;
