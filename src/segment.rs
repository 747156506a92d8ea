//! Input segment parsing.
//!
//! A segment line is free-form text. Runs of digits and dots are extracted as
//! tokens; everything else (spaces, tabs, slashes, letters) separates them.
//! A valid line yields exactly four tokens: start address, end address and two
//! trailing numeric fields (prefix length / count in the usual data dumps)
//! which are kept but not interpreted.

use std::sync::LazyLock;

use regex::Regex;

use crate::address::Address;
use crate::error_handling::SegmentError;

/// Number of tokens a segment line must contain.
pub const SEGMENT_TOKEN_COUNT: usize = 4;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[0-9.]+").expect("static token pattern is valid")
});

/// A closed address interval `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: Address,
    pub end: Address,
}

impl Segment {
    /// Creates a segment, rejecting inverted bounds.
    pub fn new(start: Address, end: Address) -> Result<Self, SegmentError> {
        if start > end {
            return Err(SegmentError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Segment { start, end })
    }

    /// Number of addresses covered (inclusive bounds).
    pub fn address_count(&self) -> u64 {
        u64::from(self.end.value()) - u64::from(self.start.value()) + 1
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

/// A parsed input line: the segment plus the two trailing tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLine {
    pub segment: Segment,
    pub extra: [String; 2],
}

/// Splits a line into its ordered tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(line).map(|m| m.as_str()).collect()
}

/// Parses one input line into a [`SegmentLine`].
///
/// # Errors
///
/// - [`SegmentError::MalformedSegment`] if the line does not contain exactly
///   four tokens
/// - [`SegmentError::InvalidAddress`] if either of the first two tokens is not
///   a dotted-quad address
/// - [`SegmentError::InvertedRange`] if start is after end
pub fn parse_segment_line(line: &str) -> Result<SegmentLine, SegmentError> {
    let tokens = tokenize(line);
    if tokens.len() != SEGMENT_TOKEN_COUNT {
        return Err(SegmentError::MalformedSegment {
            line: line.to_string(),
            found: tokens.len(),
        });
    }

    let start: Address = tokens[0].parse()?;
    let end: Address = tokens[1].parse()?;
    let segment = Segment::new(start, end)?;

    Ok(SegmentLine {
        segment,
        extra: [tokens[2].to_string(), tokens[3].to_string()],
    })
}

/// Parses one input line and returns only its address interval.
pub fn parse_segment(line: &str) -> Result<Segment, SegmentError> {
    parse_segment_line(line).map(|parsed| parsed.segment)
}

/// Returns `true` for lines the reader should skip silently.
pub fn is_ignorable_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
