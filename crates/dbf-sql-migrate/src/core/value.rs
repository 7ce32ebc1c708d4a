//! Field value types on both sides of the conversion.
//!
//! [`RawValue`] is what the legacy reader hands out for one field of one
//! record. [`SqlValue`] is what the record coercer hands to the destination
//! writer. Text uses `Cow` so values that need no conversion are borrowed
//! straight from the raw record.

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDateTime;

/// Rendering used whenever a date-time becomes text.
pub const DATETIME_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Longest value excerpt kept in error messages.
const DESCRIBE_LIMIT: usize = 64;

/// Untyped value produced by the legacy reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Blank or null-flagged field.
    Null,

    /// Native integer.
    Integer(i64),

    /// Native floating-point number.
    Float(f64),

    /// Native logical.
    Bool(bool),

    /// Native timestamp.
    DateTime(NaiveDateTime),

    /// Decoded text.
    Text(String),

    /// Undecoded bytes; may not be valid UTF-8.
    Bytes(Vec<u8>),
}

impl RawValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Short printable rendering for error messages.
    ///
    /// Bytes are shown escaped so the message itself never carries invalid
    /// UTF-8 or control characters.
    pub fn describe(&self) -> String {
        let full = match self {
            RawValue::Null => return "NULL".to_string(),
            RawValue::Integer(v) => v.to_string(),
            RawValue::Float(v) => v.to_string(),
            RawValue::Bool(v) => v.to_string(),
            RawValue::DateTime(v) => v.format(DATETIME_TEXT_FORMAT).to_string(),
            RawValue::Text(s) => format!("'{}'", s.escape_debug()),
            RawValue::Bytes(b) => format!("b\"{}\"", b.escape_ascii()),
        };
        truncate(full)
    }
}

fn truncate(mut s: String) -> String {
    if s.len() > DESCRIBE_LIMIT {
        let mut cut = DESCRIBE_LIMIT;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Integer(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(v: NaiveDateTime) -> Self {
        RawValue::DateTime(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(v)
    }
}

impl From<&[u8]> for RawValue {
    fn from(v: &[u8]) -> Self {
        RawValue::Bytes(v.to_vec())
    }
}

/// Value in a form the destination store accepts.
///
/// Booleans have no variant of their own: they travel as `F64` 0.0/1.0.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// SQL NULL.
    Null,

    /// 64-bit signed integer.
    I64(i64),

    /// Double precision float (also used for boolean columns).
    F64(f64),

    /// Text with zero-copy support.
    Text(Cow<'a, str>),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::I64(v) => SqlValue::I64(v),
            SqlValue::F64(v) => SqlValue::F64(v),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::DateTime(v) => SqlValue::DateTime(v),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Create a text value from a borrowed string slice.
    #[must_use]
    pub fn text_borrowed(s: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(s))
    }

    /// Create a text value from an owned String.
    #[must_use]
    pub fn text_owned(s: String) -> SqlValue<'static> {
        SqlValue::Text(Cow::Owned(s))
    }
}

impl fmt::Display for SqlValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::I64(v) => write!(f, "{}", v),
            SqlValue::F64(v) => write!(f, "{:?}", v),
            SqlValue::Text(v) => write!(f, "{:?}", v),
            SqlValue::DateTime(v) => write!(f, "{}", v.format(DATETIME_TEXT_FORMAT)),
        }
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<NaiveDateTime> for SqlValue<'static> {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

/// A group of coerced rows written to the destination in one transaction.
#[derive(Debug, Default)]
pub struct Batch {
    /// Rows in this batch, one value per column in table order.
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl Batch {
    /// Create a new batch with the given rows.
    pub fn new(rows: Vec<Vec<SqlValue<'static>>>) -> Self {
        Self { rows }
    }

    /// Create an empty batch with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<SqlValue<'static>>) {
        self.rows.push(row);
    }

    /// Take the accumulated rows, leaving this batch empty.
    pub fn take(&mut self) -> Batch {
        Batch {
            rows: std::mem::take(&mut self.rows),
        }
    }

    /// Get the number of rows in this batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sql_value_into_owned() {
        let source = String::from("hello");
        let borrowed: SqlValue<'_> = SqlValue::text_borrowed(&source);
        let owned: SqlValue<'static> = borrowed.into_owned();
        assert_eq!(owned, SqlValue::Text(Cow::Owned("hello".to_string())));
    }

    #[test]
    fn test_is_null() {
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::I64(42).is_null());
        assert!(RawValue::Null.is_null());
        assert!(!RawValue::Bytes(vec![]).is_null());
    }

    #[test]
    fn test_describe_escapes_bytes() {
        let raw = RawValue::Bytes(vec![b'a', 0xff, b'\n']);
        assert_eq!(raw.describe(), "b\"a\\xff\\n\"");
    }

    #[test]
    fn test_describe_truncates_long_values() {
        let raw = RawValue::Text("é".repeat(100));
        let described = raw.describe();
        assert!(described.ends_with("..."));
        assert!(described.len() <= DESCRIBE_LIMIT + 3);
    }

    #[test]
    fn test_datetime_display() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(SqlValue::DateTime(dt).to_string(), "2020-01-01 00:00:00");

        let with_millis = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 5, 250)
            .unwrap();
        assert_eq!(
            RawValue::DateTime(with_millis).describe(),
            "2020-01-01 12:30:05.250"
        );
    }

    #[test]
    fn test_batch_operations() {
        let mut batch = Batch::with_capacity(2);
        batch.push(vec![SqlValue::I64(1), SqlValue::text_owned("a".to_string())]);
        batch.push(vec![SqlValue::I64(2), SqlValue::text_owned("b".to_string())]);
        assert_eq!(batch.len(), 2);

        let taken = batch.take();
        assert_eq!(taken.len(), 2);
        assert!(batch.is_empty());
    }
}
