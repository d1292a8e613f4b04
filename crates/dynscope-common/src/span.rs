//! Byte-offset source spans.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open byte range `[start, end)` inside one source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Sentinel for synthesized nodes that have no source text.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Span of `len` bytes starting at `start`.
    #[inline]
    pub const fn at(start: u32, len: u32) -> Self {
        Span {
            start,
            end: start + len,
        }
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Check whether `self` begins before `other` in the source.
    #[inline]
    pub const fn precedes(self, other: Span) -> bool {
        self.start < other.start
    }

    /// Smallest span covering both inputs.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
