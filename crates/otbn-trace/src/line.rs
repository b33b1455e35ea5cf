//! Body lines of a trace entry.
//!
//! Every line after an entry header has the shape
//!
//! ```text
//! KIND ' ' LOCATION ': ' VALUE
//! ```
//!
//! where `KIND` is one of `<`, `>`, `R` or `W`. We unpack lines just far
//! enough to key them by location so that successive writes to the same
//! place can be merged and compared.

use std::fmt;

use tracing::trace;

use crate::error::{ParseError, Result};

/// Separator between the location and the value of a body line.
const LOC_SEPARATOR: &str = ": ";

/// The tag at the start of a body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// `<`
    ReadBefore,
    /// `>`
    ReadAfter,
    /// `R`
    RegisterWrite,
    /// `W`
    MemoryWrite,
}

impl LineKind {
    /// Map a tag character to a kind.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::ReadBefore),
            '>' => Some(Self::ReadAfter),
            'R' => Some(Self::RegisterWrite),
            'W' => Some(Self::MemoryWrite),
            _ => None,
        }
    }

    /// The tag character used in trace text.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::ReadBefore => '<',
            Self::ReadAfter => '>',
            Self::RegisterWrite => 'R',
            Self::MemoryWrite => 'W',
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One read or write observed in a cycle.
///
/// Equality ignores the raw text, so two lines that differ only in
/// surrounding whitespace compare equal.
#[derive(Debug, Clone)]
pub struct BodyLine {
    kind: LineKind,
    location: String,
    value: String,
    raw: String,
}

impl BodyLine {
    /// Parse a single body line.
    ///
    /// `origin` names where the line came from (e.g. `"RTL"`) and only shows
    /// up in error messages. The value is not interpreted beyond checking
    /// that it is non-empty.
    pub fn parse(origin: &str, line: &str) -> Result<Self> {
        let malformed = |reason: &'static str| ParseError::MalformedLine {
            origin: origin.to_string(),
            line: line.to_string(),
            reason,
        };

        let mut chars = line.chars();
        let tag = chars.next().ok_or_else(|| malformed("empty line"))?;
        let kind = LineKind::from_char(tag).ok_or_else(|| malformed("unknown line type"))?;
        if chars.next() != Some(' ') {
            return Err(malformed("expected a space after the line type"));
        }

        // The tag is one of four ASCII characters, so the rest starts at byte 2.
        let rest = &line[2..];
        let (location, value) = rest
            .split_once(LOC_SEPARATOR)
            .ok_or_else(|| malformed("missing ': ' separator"))?;
        if location.is_empty() {
            return Err(malformed("empty location"));
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(malformed("empty value"));
        }

        trace!(origin, %kind, location, value, "parsed body line");
        Ok(Self {
            kind,
            location: location.to_string(),
            value: value.to_string(),
            raw: line.to_string(),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> LineKind {
        self.kind
    }

    /// The register name or address this line refers to.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The value exactly as it appeared in the trace (trimmed).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The original line.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True if kind and location match, whatever the value.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.kind == other.kind && self.location == other.location
    }
}

impl PartialEq for BodyLine {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(other) && self.value == other.value
    }
}

impl Eq for BodyLine {}

/// Canonical form, independent of the original spacing.
impl fmt::Display for BodyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{LOC_SEPARATOR}{}", self.kind, self.location, self.value)
    }
}
