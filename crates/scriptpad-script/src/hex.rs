#![forbid(unsafe_code)]

//! Strict hexadecimal codec.

use std::fmt;

/// Why a hex string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// The input has an odd number of characters.
    OddLength { len: usize },
    /// A character outside `[0-9a-fA-F]`, at the given character index.
    InvalidDigit { index: usize, ch: char },
}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OddLength { len } => write!(f, "odd-length hex string ({len} characters)"),
            Self::InvalidDigit { index, ch } => {
                write!(f, "invalid hex digit {ch:?} at index {index}")
            }
        }
    }
}

impl std::error::Error for HexError {}

/// Decode a hex string into bytes.
///
/// No whitespace or `0x` prefix is accepted. The empty string decodes to no
/// bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, HexError> {
    let len = text.chars().count();
    if len % 2 != 0 {
        return Err(HexError::OddLength { len });
    }

    let mut out = Vec::with_capacity(len / 2);
    let mut high: Option<u8> = None;
    for (index, ch) in text.chars().enumerate() {
        let nibble = ch
            .to_digit(16)
            .ok_or(HexError::InvalidDigit { index, ch })? as u8;
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    Ok(out)
}

/// Encode bytes as lower-case hex.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}
