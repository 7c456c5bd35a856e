use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const BINARY_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const BYTE_CONVERSION_RATE: f64 = 1024.0;

/// A number of bytes that can be read from user-facing configuration strings such as
/// "1048576", "512kb", "1 MiB" or "2GB".  All suffixes are interpreted as binary (1024-based) units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ByteSizeParseError {
    #[error("empty byte size")]
    Empty,

    #[error("invalid byte size number in {0:?}")]
    InvalidNumber(String),

    #[error("unknown byte size unit {0:?}")]
    UnknownUnit(String),

    #[error("byte size {0:?} overflows u64")]
    Overflow(String),
}

impl ByteSize {
    pub const fn new(n_bytes: u64) -> Self {
        Self(n_bytes)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ByteSize {
    fn from(n_bytes: u64) -> Self {
        Self(n_bytes)
    }
}

impl From<ByteSize> for u64 {
    fn from(size: ByteSize) -> Self {
        size.0
    }
}

impl FromStr for ByteSize {
    type Err = ByteSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ByteSizeParseError::Empty);
        }

        let split = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "b" | "byte" | "bytes" => 1,
            "k" | "kb" | "kib" => 1 << 10,
            "m" | "mb" | "mib" => 1 << 20,
            "g" | "gb" | "gib" => 1 << 30,
            "t" | "tb" | "tib" => 1 << 40,
            other => return Err(ByteSizeParseError::UnknownUnit(other.to_owned())),
        };

        if let Ok(whole) = number.parse::<u64>() {
            return whole
                .checked_mul(multiplier)
                .map(ByteSize)
                .ok_or_else(|| ByteSizeParseError::Overflow(s.to_owned()));
        }

        let fractional: f64 = number.parse().map_err(|_| ByteSizeParseError::InvalidNumber(s.to_owned()))?;
        let n_bytes = (fractional * multiplier as f64).round();
        if !n_bytes.is_finite() || n_bytes > u64::MAX as f64 {
            return Err(ByteSizeParseError::Overflow(s.to_owned()));
        }

        Ok(ByteSize(n_bytes as u64))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&file_size_abbrev(self.0))
    }
}

/// Formats a byte count for display, e.g. `1048576` -> "1 MB" and `1536` -> "1.5 KB".
///
/// Uses binary units with a single decimal place; a trailing ".0" is dropped.  Sizes beyond
/// the gigabyte range stay in GB.
pub fn file_size_abbrev(n_bytes: u64) -> String {
    let mut size = n_bytes as f64;
    let mut unit_index = 0;

    while size >= BYTE_CONVERSION_RATE && unit_index < BINARY_UNITS.len() - 1 {
        size /= BYTE_CONVERSION_RATE;
        unit_index += 1;
    }

    let formatted = format!("{size:.1}");
    let formatted = formatted.strip_suffix(".0").unwrap_or(&formatted);

    format!("{formatted} {}", BINARY_UNITS[unit_index])
}
