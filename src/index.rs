//! Index resolution for array selections.
//!
//! Declared indices may be negative (`-1` is the last element). When the array
//! length is known while the query is being declared, every position is
//! normalized to a plain offset from the start and bounds are checked eagerly.
//! When the length is only known at execution time the sign is still resolved,
//! but the position stays end-relative and bounds checking is left to whoever
//! runs the query (see [`Slice::expand`]).
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A resolved element position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Offset from the first element.
    Start(u64),
    /// Offset from one past the last element: `End(1)` is the last element.
    End(u64),
}

/// Inclusive pair of resolved positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Index-selection descriptor attached to an array segment of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Slice {
    /// Entire array, kept distinct from `0..=n-1` so executors need no length.
    All,
    Single { index: Position },
    Range { span: Span },
    /// Declared order and duplicates are preserved.
    IndexSet { indices: Vec<Position> },
    /// Ranges are neither merged nor deduplicated.
    RangeSet { ranges: Vec<Span> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("index {index} is out of bounds for length {len}")]
    OutOfBounds { index: i64, len: u64 },
    #[error("range {start}..{end} is empty after resolution")]
    Inverted { start: Position, end: Position },
    #[error("`{op}` needs at least one entry")]
    Empty { op: &'static str },
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLUTION
// ————————————————————————————————————————————————————————————————————————————

/// Resolve a single declared index against an optional static length.
pub fn resolve(index: i64, len: Option<u32>) -> Result<Position, IndexError> {
    let position = if index >= 0 {
        Position::Start(index as u64)
    } else {
        Position::End(index.unsigned_abs())
    };
    match len {
        None => Ok(position),
        Some(n) => position
            .against(u64::from(n))
            .map(Position::Start)
            .ok_or(IndexError::OutOfBounds { index, len: u64::from(n) }),
    }
}

/// Resolve an inclusive range. Inverted ranges are rejected, never swapped.
pub fn resolve_range(start: i64, end: i64, len: Option<u32>) -> Result<Span, IndexError> {
    let span = Span {
        start: resolve(start, len)?,
        end: resolve(end, len)?,
    };
    if span.is_inverted() {
        return Err(IndexError::Inverted { start: span.start, end: span.end });
    }
    Ok(span)
}

pub fn resolve_indices(indices: &[i64], len: Option<u32>) -> Result<Vec<Position>, IndexError> {
    if indices.is_empty() {
        return Err(IndexError::Empty { op: "indices" });
    }
    indices.iter().map(|&i| resolve(i, len)).collect()
}

pub fn resolve_ranges(ranges: &[(i64, i64)], len: Option<u32>) -> Result<Vec<Span>, IndexError> {
    if ranges.is_empty() {
        return Err(IndexError::Empty { op: "ranges" });
    }
    ranges
        .iter()
        .map(|&(start, end)| resolve_range(start, end, len))
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Position {
    /// Concrete offset for an array of length `len`, or `None` if out of bounds.
    pub fn against(self, len: u64) -> Option<u64> {
        match self {
            Position::Start(i) if i < len => Some(i),
            Position::End(back) if back >= 1 && back <= len => Some(len - back),
            _ => None,
        }
    }

    /// Declared form of this position (end-relative positions are negative).
    ///
    /// Every position produced by [`resolve`] round-trips exactly, `End(2^63)`
    /// included; hand-built positions beyond the `i64` range saturate.
    pub fn as_declared(self) -> i64 {
        match self {
            Position::Start(i) => i64::try_from(i).unwrap_or(i64::MAX),
            Position::End(back) => 0i64.checked_sub_unsigned(back).unwrap_or(i64::MIN),
        }
    }

    pub fn is_end_relative(self) -> bool {
        matches!(self, Position::End(_))
    }
}

impl Span {
    /// True when the order of both endpoints is decidable and wrong.
    /// A start-relative/end-relative mix is only decidable at execution time.
    fn is_inverted(&self) -> bool {
        match (self.start, self.end) {
            (Position::Start(a), Position::Start(b)) => a > b,
            (Position::End(a), Position::End(b)) => a < b,
            _ => false,
        }
    }

    fn expand_into(&self, len: u64, out: &mut Vec<u64>) -> Result<(), IndexError> {
        let start = self.start.against(len).ok_or(IndexError::OutOfBounds {
            index: self.start.as_declared(),
            len,
        })?;
        let end = self.end.against(len).ok_or(IndexError::OutOfBounds {
            index: self.end.as_declared(),
            len,
        })?;
        if start > end {
            return Err(IndexError::Inverted { start: self.start, end: self.end });
        }
        out.extend(start..=end);
        Ok(())
    }
}

impl Slice {
    /// Whether bounds checking was deferred for any endpoint of this descriptor.
    pub fn is_deferred(&self) -> bool {
        match self {
            Slice::All => false,
            Slice::Single { index } => index.is_end_relative(),
            Slice::Range { span } => span.start.is_end_relative() || span.end.is_end_relative(),
            Slice::IndexSet { indices } => indices.iter().any(|p| p.is_end_relative()),
            Slice::RangeSet { ranges } => ranges
                .iter()
                .any(|s| s.start.is_end_relative() || s.end.is_end_relative()),
        }
    }

    /// Concrete element offsets, in declared order, for an array of length `len`.
    ///
    /// This is the execution-time bounds check for selections declared against
    /// arrays of unknown length.
    pub fn expand(&self, len: u64) -> Result<Vec<u64>, IndexError> {
        let mut out = Vec::new();
        match self {
            Slice::All => out.extend(0..len),
            Slice::Single { index } => out.push(checked(*index, len)?),
            Slice::Range { span } => span.expand_into(len, &mut out)?,
            Slice::IndexSet { indices } => {
                for index in indices {
                    out.push(checked(*index, len)?);
                }
            }
            Slice::RangeSet { ranges } => {
                for span in ranges {
                    span.expand_into(len, &mut out)?;
                }
            }
        }
        Ok(out)
    }
}

fn checked(position: Position, len: u64) -> Result<u64, IndexError> {
    position.against(len).ok_or(IndexError::OutOfBounds {
        index: position.as_declared(),
        len,
    })
}

// Positions travel as plain integers: end-relative ones are negative.
impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_declared())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(if raw >= 0 { Position::Start(raw as u64) } else { Position::End(raw.unsigned_abs()) })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_declared())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, xs: &[T]) -> fmt::Result {
            for (i, x) in xs.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{x}")?;
            }
            Ok(())
        }
        match self {
            Slice::All => f.write_str("*"),
            Slice::Single { index } => write!(f, "{index}"),
            Slice::Range { span } => write!(f, "{span}"),
            Slice::IndexSet { indices } => joined(f, indices),
            Slice::RangeSet { ranges } => joined(f, ranges),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
