//! Record coercion: raw legacy values to values the destination accepts.
//!
//! Coercion is driven entirely by the column's [`TargetType`], which is fixed
//! once per table by the type mapper. Nothing is re-inferred per row.
//!
//! | Target   | Accepted raw values                          | Result                 |
//! |----------|----------------------------------------------|------------------------|
//! | Integer  | integers, finite floats, bools, numeric text | `I64`                  |
//! | Boolean  | bools, numbers, numeric text                 | `F64` 0.0/1.0          |
//! | DateTime | native date-times only                       | `DateTime`             |
//! | Float    | see [`FloatPolicy`]                          | `F64` or text          |
//! | String   | anything                                     | `Text`, escaped if not UTF-8 |
//!
//! `Null` passes through as `Null` for every target.

mod escape;

pub use escape::{decode_text, escape_bytes, unescape_bytes, DecodedText, EscapeError};

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::value::{RawValue, SqlValue, DATETIME_TEXT_FORMAT};
use crate::typemap::TargetType;

/// How values in Float columns are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatPolicy {
    /// Parse into `F64`; non-numeric values are a conversion error.
    #[default]
    Parse,

    /// Treat like a string column and let the store coerce the text.
    Passthrough,
}

impl std::str::FromStr for FloatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parse" => Ok(FloatPolicy::Parse),
            "passthrough" => Ok(FloatPolicy::Passthrough),
            other => Err(format!(
                "unknown float policy '{}', expected 'parse' or 'passthrough'",
                other
            )),
        }
    }
}

/// A field value that cannot be coerced to its column's target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    /// Value is not parseable as the target type.
    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: &'static str },

    /// DateTime column holding something other than a native date-time.
    #[error("DateTime is in wrong format: {value}")]
    Format { value: String },
}

impl CoerceError {
    fn conversion(raw: &RawValue, target: &TargetType) -> Self {
        CoerceError::Conversion {
            value: raw.describe(),
            target: target.name(),
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<'a> {
    /// The value to insert.
    pub value: SqlValue<'a>,

    /// Whether the escaping fallback was applied.
    pub escaped: bool,
}

impl<'a> Coerced<'a> {
    fn plain(value: SqlValue<'a>) -> Self {
        Self {
            value,
            escaped: false,
        }
    }
}

/// Coerce one raw field value to its column's target type.
pub fn coerce<'a>(
    raw: &'a RawValue,
    target: &TargetType,
    policy: FloatPolicy,
) -> Result<Coerced<'a>, CoerceError> {
    if raw.is_null() {
        return Ok(Coerced::plain(SqlValue::Null));
    }

    match target {
        TargetType::Integer => to_integer(raw, target).map(|v| Coerced::plain(SqlValue::I64(v))),
        TargetType::Boolean => to_float(raw, target).map(|v| Coerced::plain(SqlValue::F64(v))),
        TargetType::DateTime => match raw {
            RawValue::DateTime(dt) => Ok(Coerced::plain(SqlValue::DateTime(*dt))),
            other => Err(CoerceError::Format {
                value: other.describe(),
            }),
        },
        TargetType::Float if policy == FloatPolicy::Parse => {
            to_float(raw, target).map(|v| Coerced::plain(SqlValue::F64(v)))
        }
        TargetType::Float | TargetType::String(_) => Ok(to_text(raw)),
    }
}

fn to_integer(raw: &RawValue, target: &TargetType) -> Result<i64, CoerceError> {
    match raw {
        RawValue::Integer(v) => Ok(*v),
        RawValue::Float(v) => float_to_integer(*v).ok_or_else(|| CoerceError::conversion(raw, target)),
        RawValue::Bool(v) => Ok(i64::from(*v)),
        RawValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoerceError::conversion(raw, target)),
        RawValue::Bytes(b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| CoerceError::conversion(raw, target)),
        RawValue::DateTime(_) | RawValue::Null => Err(CoerceError::conversion(raw, target)),
    }
}

/// Truncate toward zero; `None` for non-finite or out-of-range values.
fn float_to_integer(v: f64) -> Option<i64> {
    let truncated = v.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// Only finite values convert: SQLite would silently store NaN as NULL.
fn to_float(raw: &RawValue, target: &TargetType) -> Result<f64, CoerceError> {
    let value = match raw {
        RawValue::Integer(v) => Some(*v as f64),
        RawValue::Float(v) => Some(*v),
        RawValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
        RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        RawValue::Bytes(b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok()),
        RawValue::DateTime(_) | RawValue::Null => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoerceError::conversion(raw, target))
}

fn to_text(raw: &RawValue) -> Coerced<'_> {
    let text = match raw {
        RawValue::Text(s) => Cow::Borrowed(s.as_str()),
        RawValue::Bytes(b) => match decode_text(b) {
            DecodedText::Clean(s) => Cow::Borrowed(s),
            DecodedText::Escaped(s) => {
                return Coerced {
                    value: SqlValue::Text(Cow::Owned(s)),
                    escaped: true,
                }
            }
        },
        RawValue::Integer(v) => Cow::Owned(v.to_string()),
        RawValue::Float(v) => Cow::Owned(v.to_string()),
        RawValue::Bool(v) => Cow::Owned(v.to_string()),
        RawValue::DateTime(v) => Cow::Owned(v.format(DATETIME_TEXT_FORMAT).to_string()),
        RawValue::Null => return Coerced::plain(SqlValue::Null),
    };
    Coerced::plain(SqlValue::Text(text))
}
