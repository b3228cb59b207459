//! `Range: bytes=<start>-[<end>]` parsing and resolution.
//!
//! Only a single, explicit first-byte position is accepted. Suffix ranges
//! (`bytes=-500`), multiple ranges and other units are rejected.

use std::str::FromStr;

const BYTES_PREFIX: &str = "bytes=";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range header: {0:?}")]
    Malformed(String),

    #[error("range start {start} is after end {end}")]
    Inverted { start: u64, end: u64 },

    #[error("range start {start} is not below size {size}")]
    Unsatisfiable { start: u64, size: u64 },
}

/// A parsed range header whose end may still be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeSpec {
    pub fn parse(header: &str) -> Result<Self, RangeError> {
        let malformed = || RangeError::Malformed(header.to_string());

        let value = header.trim();
        let prefix = value.get(..BYTES_PREFIX.len()).ok_or_else(malformed)?;
        if !prefix.eq_ignore_ascii_case(BYTES_PREFIX) {
            return Err(malformed());
        }
        let (start, end) = value[BYTES_PREFIX.len()..]
            .split_once('-')
            .ok_or_else(malformed)?;

        let start = parse_position(start.trim()).ok_or_else(malformed)?;
        let end = match end.trim() {
            "" => None,
            end => Some(parse_position(end).ok_or_else(malformed)?),
        };

        Ok(Self { start, end })
    }

    /// Resolves the requested range against the plaintext size.
    ///
    /// An open or overshooting end is clamped to `size - 1`.
    pub fn resolve(&self, size: u64) -> Result<ByteRange, RangeError> {
        if self.start >= size {
            return Err(RangeError::Unsatisfiable {
                start: self.start,
                size,
            });
        }
        let last = size - 1;
        let end = self.end.unwrap_or(last);
        if self.start > end {
            return Err(RangeError::Inverted {
                start: self.start,
                end,
            });
        }
        Ok(ByteRange {
            start: self.start,
            end: end.min(last),
        })
    }
}

impl FromStr for RangeSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_position(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Inclusive, non-empty plaintext byte window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a satisfied request.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// `Content-Range` value for a 416 response.
pub fn unsatisfied_content_range(size: u64) -> String {
    format!("bytes */{size}")
}
