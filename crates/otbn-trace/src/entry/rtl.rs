use std::fmt;

use crate::error::{MergeError, ParseError, Result};
use crate::line::BodyLine;
use crate::phase::{PhaseVocabulary, default_vocabulary};

use super::{Entry, TraceEntry, split_lines};

const ORIGIN: &str = "RTL";

/// An entry from the RTL tracer.
///
/// RTL blocks are a header line followed by body lines:
///
/// ```text
/// E PC: 0x00000004, insn: 0x00100093
/// < x0: 0x00000000
/// > x1: 0x00000001
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtlEntry(Entry);

impl RtlEntry {
    /// Parse one block using the default header vocabulary.
    pub fn parse(block: &str) -> Result<Self> {
        Self::parse_with(block, default_vocabulary())
    }

    pub fn parse_with(block: &str, vocabulary: &PhaseVocabulary) -> Result<Self> {
        let mut lines = split_lines(block);
        let header = lines.next().ok_or_else(|| ParseError::MalformedBlock {
            origin: ORIGIN.to_string(),
            block: block.to_string(),
            reason: "empty trace entry".to_string(),
        })?;

        let body = lines
            .map(|line| BodyLine::parse(ORIGIN, line))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| ParseError::MalformedBlock {
                origin: ORIGIN.to_string(),
                block: block.to_string(),
                reason: err.to_string(),
            })?;

        Ok(Self(Entry::new(header, body, vocabulary)))
    }

    #[must_use]
    pub fn into_entry(self) -> Entry {
        self.0
    }
}

impl From<Entry> for RtlEntry {
    fn from(entry: Entry) -> Self {
        Self(entry)
    }
}

impl TraceEntry for RtlEntry {
    fn entry(&self) -> &Entry {
        &self.0
    }

    fn merge(self, other: Self, other_first: bool) -> std::result::Result<Self, MergeError> {
        self.0.merge(other.0, other_first).map(Self)
    }
}

impl fmt::Display for RtlEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
