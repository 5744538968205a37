//! Route pattern parsing.
//!
//! # Responsibilities
//! - Split patterns and request paths on `/`, dropping empty segments
//! - Classify pattern segments as static, parameter (`:name`) or wildcard (`*name`)
//! - Stop pattern parsing at the first wildcard segment
//!
//! # Design Decisions
//! - No normalization: case and trailing slashes never change segment text
//! - Patterns and paths share one splitter so segment positions line up
//! - Segments after a wildcard are ignored, not rejected, so `/a/*x` and
//!   `/a/*x/more` land on the same trie node

/// Leading character of a parameter segment.
pub const PARAM_MARKER: char = ':';

/// Leading character of a wildcard segment.
pub const WILDCARD_MARKER: char = '*';

/// What a pattern segment matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Matches one path segment with identical text.
    Static,
    /// Matches any single path segment and binds it.
    Param,
    /// Matches every remaining path segment and binds them joined by `/`.
    Wildcard,
}

impl SegmentKind {
    /// Classify a raw segment by its first character.
    pub fn of(raw: &str) -> Self {
        if raw.starts_with(PARAM_MARKER) {
            SegmentKind::Param
        } else if raw.starts_with(WILDCARD_MARKER) {
            SegmentKind::Wildcard
        } else {
            SegmentKind::Static
        }
    }

    /// True for parameter and wildcard segments.
    pub fn accepts_any(self) -> bool {
        !matches!(self, SegmentKind::Static)
    }
}

/// One segment of a parsed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    raw: &'a str,
    kind: SegmentKind,
}

impl<'a> Segment<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            kind: SegmentKind::of(raw),
        }
    }

    /// Segment text including any marker.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Binding name for parameter and wildcard segments, literal text otherwise.
    pub fn name(&self) -> &'a str {
        binding_name(self.raw, self.kind)
    }
}

/// Strip the one-byte marker from a parameter or wildcard segment.
pub(crate) fn binding_name(raw: &str, kind: SegmentKind) -> &str {
    match kind {
        SegmentKind::Static => raw,
        SegmentKind::Param | SegmentKind::Wildcard => &raw[1..],
    }
}

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

/// Parse a route pattern into ordered segments.
///
/// Parsing stops right after the first wildcard segment.
pub fn parse_pattern(pattern: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for part in split_path(pattern) {
        let segment = Segment::new(part);
        segments.push(segment);
        if segment.kind() == SegmentKind::Wildcard {
            break;
        }
    }
    segments
}
