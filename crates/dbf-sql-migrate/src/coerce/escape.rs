//! Byte-to-text decoding with a lossless escaping fallback.
//!
//! Legacy character data is supposed to be text but often is not: mixed code
//! pages, binary garbage in spare columns, half-written records. Bytes that
//! decode as UTF-8 are used as-is. Anything else is rendered with every byte
//! escaped, which keeps the full byte content in printable form and lets
//! [`unescape_bytes`] recover it exactly.

use thiserror::Error;

/// Outcome of decoding a byte field as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedText<'a> {
    /// The bytes are valid UTF-8.
    Clean(&'a str),
    /// The bytes are not valid UTF-8 and were escaped.
    Escaped(String),
}

impl<'a> DecodedText<'a> {
    pub fn is_escaped(&self) -> bool {
        matches!(self, DecodedText::Escaped(_))
    }
}

/// Decode bytes as UTF-8, falling back to [`escape_bytes`].
pub fn decode_text(bytes: &[u8]) -> DecodedText<'_> {
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedText::Clean(text),
        Err(_) => DecodedText::Escaped(escape_bytes(bytes)),
    }
}

/// Render every byte in printable form.
///
/// Printable ASCII is kept, `\t`, `\n`, `\r`, `\'`, `\"` and `\\` use their
/// usual escapes and every other byte becomes `\xNN`.
pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

/// Malformed input to [`unescape_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("unknown escape sequence '\\{found}' at byte {position}")]
    Unknown { position: usize, found: char },

    #[error("truncated escape sequence at byte {position}")]
    Truncated { position: usize },

    #[error("invalid hex escape at byte {position}")]
    InvalidHex { position: usize },
}

/// Inverse of [`escape_bytes`].
pub fn unescape_bytes(text: &str) -> Result<Vec<u8>, EscapeError> {
    let input = text.as_bytes();
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }

        let position = i;
        let escape = *input
            .get(i + 1)
            .ok_or(EscapeError::Truncated { position })?;
        match escape {
            b't' => out.push(b'\t'),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'x' => {
                let digits = input
                    .get(i + 2..i + 4)
                    .ok_or(EscapeError::Truncated { position })?;
                let value = match digits {
                    [hi, lo] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                        hex_value(*hi) << 4 | hex_value(*lo)
                    }
                    _ => return Err(EscapeError::InvalidHex { position }),
                };
                out.push(value);
                i += 4;
                continue;
            }
            other => {
                return Err(EscapeError::Unknown {
                    position,
                    found: other as char,
                })
            }
        }
        i += 2;
    }

    Ok(out)
}

/// Value of one ASCII hex digit; callers check `is_ascii_hexdigit` first.
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
