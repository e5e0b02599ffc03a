//! HTTP `Range` header handling for object reads.

use std::fmt;
use std::str::FromStr;

use crate::error::{GatewayError, GatewayResult};

/// A single byte range as carried by an HTTP `Range: bytes=...` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpRange {
    /// `bytes=start-end` or, with no end, `bytes=start-`. `end` is inclusive.
    Bounded { start: u64, end: Option<u64> },
    /// `bytes=-n`: the last `n` bytes.
    Suffix(u64),
}

impl HttpRange {
    /// Resolve the range against an object of `size` bytes into an
    /// `(offset, length)` pair.
    ///
    /// A closed end past the object is clamped to its last byte and a suffix
    /// longer than the object selects the whole object. A start at or past
    /// the end of the object, or a zero-length suffix, is unsatisfiable.
    pub fn offset_length(&self, size: u64) -> GatewayResult<(u64, u64)> {
        match *self {
            Self::Suffix(0) => Err(GatewayError::InvalidRange {
                offset_begin: size,
                offset_end: size,
                resource_size: size,
            }),
            Self::Suffix(n) => {
                let length = n.min(size);
                Ok((size - length, length))
            }
            Self::Bounded { start, .. } if start >= size => Err(GatewayError::InvalidRange {
                offset_begin: start,
                offset_end: size,
                resource_size: size,
            }),
            Self::Bounded { start, end: None } => Ok((start, size - start)),
            Self::Bounded {
                start,
                end: Some(end),
            } => {
                let end = end.min(size - 1);
                Ok((start, end - start + 1))
            }
        }
    }
}

/// Resolve an optional range against an object of `size` bytes. No range
/// selects the whole object.
pub fn resolve(range: Option<&HttpRange>, size: u64) -> GatewayResult<(u64, u64)> {
    match range {
        Some(range) => range.offset_length(size),
        None => Ok((0, size)),
    }
}

impl FromStr for HttpRange {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GatewayError::InvalidRangeSpec(s.to_string());
        let spec = s.trim().strip_prefix("bytes=").ok_or_else(invalid)?;
        if spec.contains(',') {
            return Err(invalid());
        }
        let (start, end) = spec.split_once('-').ok_or_else(invalid)?;
        let parse = |v: &str| v.trim().parse::<u64>().map_err(|_| invalid());
        match (start.trim().is_empty(), end.trim().is_empty()) {
            (true, true) => Err(invalid()),
            (true, false) => Ok(Self::Suffix(parse(end)?)),
            (false, true) => Ok(Self::Bounded {
                start: parse(start)?,
                end: None,
            }),
            (false, false) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if end < start {
                    return Err(invalid());
                }
                Ok(Self::Bounded {
                    start,
                    end: Some(end),
                })
            }
        }
    }
}

impl fmt::Display for HttpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suffix(n) => write!(f, "bytes=-{n}"),
            Self::Bounded { start, end: None } => write!(f, "bytes={start}-"),
            Self::Bounded {
                start,
                end: Some(end),
            } => write!(f, "bytes={start}-{end}"),
        }
    }
}
