//! Trace entries: one logical execution step.
//!
//! An [`Entry`] is a header plus the body lines seen in that cycle, keyed by
//! location. When the RTL stalls or wipes over several cycles, the partial
//! entries are merged until the final one arrives, so a single entry may
//! cover many cycles. Per location, lines keep the order they were seen in.

mod iss;
mod rtl;

pub use iss::{IssData, IssEntry};
pub use rtl::RtlEntry;

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::MergeError;
use crate::line::BodyLine;
use crate::phase::{self, Phase, PhaseVocabulary};

/// Common part of RTL and ISS entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    phase: Phase,
    header: String,
    // Never holds an empty vector.
    writes: BTreeMap<String, Vec<BodyLine>>,
}

impl Entry {
    /// Build an entry from a header and its body lines.
    ///
    /// The phase comes from classifying `header`. An invalid entry keeps no
    /// lines.
    #[must_use]
    pub fn new(
        header: impl Into<String>,
        lines: impl IntoIterator<Item = BodyLine>,
        vocabulary: &PhaseVocabulary,
    ) -> Self {
        let header = header.into();
        let phase = vocabulary.classify(&header);
        let mut writes: BTreeMap<String, Vec<BodyLine>> = BTreeMap::new();
        if phase != Phase::Invalid {
            for line in lines {
                writes
                    .entry(line.location().to_string())
                    .or_default()
                    .push(line);
            }
        }
        Self {
            phase,
            header,
            writes,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.phase.is_partial()
    }

    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.phase.is_final()
    }

    /// True if `self` may follow `previous` within one step.
    #[must_use]
    pub const fn is_compatible(&self, previous: &Self) -> bool {
        phase::is_compatible(previous.phase, self.phase)
    }

    /// Like [`Self::is_compatible`], but a stall continuation must also
    /// describe the same instruction (identical header apart from the tag).
    #[must_use]
    pub fn continues(&self, previous: &Self) -> bool {
        self.is_compatible(previous)
            && (previous.phase != Phase::Stall
                || PhaseVocabulary::strip_tag(&previous.header)
                    == PhaseVocabulary::strip_tag(&self.header))
    }

    /// Lines for `location`, in the order they were seen, or `None` if this
    /// entry never touches it.
    #[must_use]
    pub fn get_writes(&self, location: &str) -> Option<&[BodyLine]> {
        self.writes.get(location).map(Vec::as_slice)
    }

    /// Number of distinct locations with at least one line.
    #[must_use]
    pub fn num_locations(&self) -> usize {
        self.writes.len()
    }

    /// Locations in sorted order.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.writes.keys().map(String::as_str)
    }

    /// Merge `other` into this entry.
    ///
    /// For each location the lines of the earlier entry come first: `other`
    /// is the earlier one if `other_first` is set. The later entry is the
    /// continuation and supplies the resulting header and phase.
    pub fn merge(self, other: Self, other_first: bool) -> Result<Self, MergeError> {
        for entry in [&self, &other] {
            if entry.phase == Phase::Invalid {
                return Err(MergeError {
                    header: entry.header.clone(),
                });
            }
        }

        let (mut earlier, later) = if other_first {
            (other, self)
        } else {
            (self, other)
        };
        debug!(
            earlier = %earlier.header,
            later = %later.header,
            "merging trace entries"
        );
        for (location, lines) in later.writes {
            earlier.writes.entry(location).or_default().extend(lines);
        }
        earlier.phase = later.phase;
        earlier.header = later.header;
        Ok(earlier)
    }

    /// Write the header and then every body line, each prefixed by `indent`.
    pub fn print(&self, indent: &str, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "{indent}{}", self.header)?;
        for line in self.writes.values().flatten() {
            writeln!(out, "{indent}{}", line.raw())?;
        }
        Ok(())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print("", f)
    }
}

/// Shared surface of [`RtlEntry`] and [`IssEntry`].
pub trait TraceEntry: Sized {
    fn entry(&self) -> &Entry;

    /// Merge as [`Entry::merge`], keeping source-specific data from the
    /// later operand.
    fn merge(self, other: Self, other_first: bool) -> Result<Self, MergeError>;

    fn phase(&self) -> Phase {
        self.entry().phase()
    }

    fn header(&self) -> &str {
        self.entry().header()
    }

    fn is_partial(&self) -> bool {
        self.entry().is_partial()
    }

    fn is_final(&self) -> bool {
        self.entry().is_final()
    }

    fn get_writes(&self, location: &str) -> Option<&[BodyLine]> {
        self.entry().get_writes(location)
    }

    fn num_locations(&self) -> usize {
        self.entry().num_locations()
    }
}

impl TraceEntry for Entry {
    fn entry(&self) -> &Entry {
        self
    }

    fn merge(self, other: Self, other_first: bool) -> Result<Self, MergeError> {
        Self::merge(self, other, other_first)
    }
}

/// Split a block of trace text into trimmed, non-blank lines.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty())
}
