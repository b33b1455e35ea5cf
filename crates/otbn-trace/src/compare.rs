//! Comparing an RTL entry against the matching ISS entry.
//!
//! Comparison is by value, not by text: each location written on either
//! side must be written on both, the same number of times, with equal body
//! lines in the same order. All differences for a pair of entries are
//! collected into one [`EntryMismatch`].

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, warn};

use crate::entry::{IssEntry, RtlEntry, TraceEntry};
use crate::line::BodyLine;
use crate::phase::{self, Phase};

/// Which trace a line or entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Rtl,
    Iss,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Rtl => Self::Iss,
            Self::Iss => Self::Rtl,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtl => write!(f, "RTL"),
            Self::Iss => write!(f, "ISS"),
        }
    }
}

/// Options for a single comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareConfig {
    /// During secure wipe cycles, only check which locations are written
    /// and how often, not the values written.
    pub skip_wipe_data_check: bool,
    /// Require identical header text when both phases agree.
    pub check_headers: bool,
}

impl CompareConfig {
    #[must_use]
    pub const fn with_skip_wipe_data_check(mut self, skip: bool) -> Self {
        self.skip_wipe_data_check = skip;
        self
    }

    #[must_use]
    pub const fn with_check_headers(mut self, check: bool) -> Self {
        self.check_headers = check;
        self
    }
}

/// One difference between an RTL entry and an ISS entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The entries are at incompatible points of execution, or one of them
    /// is invalid.
    PhaseMismatch {
        rtl_phase: Phase,
        iss_phase: Phase,
        rtl_header: String,
        iss_header: String,
    },
    HeaderMismatch {
        rtl_header: String,
        iss_header: String,
    },
    /// Only `side` touched `location`.
    UnilateralWrite {
        side: Side,
        location: String,
        lines: Vec<BodyLine>,
    },
    WriteCountMismatch {
        location: String,
        rtl: Vec<BodyLine>,
        iss: Vec<BodyLine>,
    },
    /// The lines at `index` in the sequences for `location` differ.
    ValueMismatch {
        location: String,
        index: usize,
        rtl: BodyLine,
        iss: BodyLine,
    },
}

impl Mismatch {
    /// The location involved, if the mismatch is about one.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::PhaseMismatch { .. } | Self::HeaderMismatch { .. } => None,
            Self::UnilateralWrite { location, .. }
            | Self::WriteCountMismatch { location, .. }
            | Self::ValueMismatch { location, .. } => Some(location),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseMismatch {
                rtl_phase,
                iss_phase,
                rtl_header,
                iss_header,
            } => write!(
                f,
                "incompatible trace entry types: RTL has {rtl_phase} (`{rtl_header}`), \
                 ISS has {iss_phase} (`{iss_header}`)"
            ),
            Self::HeaderMismatch {
                rtl_header,
                iss_header,
            } => write!(
                f,
                "entry headers differ: RTL `{rtl_header}`, ISS `{iss_header}`"
            ),
            Self::UnilateralWrite {
                side,
                location,
                lines,
            } => {
                write!(
                    f,
                    "{side} has lines for {location} but {} does not:",
                    side.other()
                )?;
                for line in lines {
                    write!(f, " `{line}`")?;
                }
                Ok(())
            }
            Self::WriteCountMismatch { location, rtl, iss } => {
                write!(
                    f,
                    "{location}: RTL has {} line(s), ISS has {}",
                    rtl.len(),
                    iss.len()
                )?;
                write_lines(f, "RTL", rtl)?;
                write_lines(f, "ISS", iss)
            }
            Self::ValueMismatch {
                location,
                index,
                rtl,
                iss,
            } => {
                if rtl.kind() == iss.kind() {
                    write!(
                        f,
                        "{location}: value mismatch at line {index}: RTL {}, ISS {}",
                        rtl.value(),
                        iss.value()
                    )
                } else {
                    write!(
                        f,
                        "{location}: line mismatch at line {index}: RTL `{rtl}`, ISS `{iss}`"
                    )
                }
            }
        }
    }
}

fn write_lines(f: &mut fmt::Formatter<'_>, side: &str, lines: &[BodyLine]) -> fmt::Result {
    write!(f, "; {side}:")?;
    for line in lines {
        write!(f, " `{line}`")?;
    }
    Ok(())
}

/// Every difference found between one RTL entry and one ISS entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMismatch {
    pub rtl_header: String,
    pub iss_header: String,
    pub problems: Vec<Mismatch>,
}

impl EntryMismatch {
    #[must_use]
    pub fn problems(&self) -> &[Mismatch] {
        &self.problems
    }

    #[must_use]
    pub fn into_problems(self) -> Vec<Mismatch> {
        self.problems
    }
}

impl fmt::Display for EntryMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RTL entry `{}` does not match ISS entry `{}` ({} problem(s)):",
            self.rtl_header,
            self.iss_header,
            self.problems.len()
        )?;
        for problem in &self.problems {
            writeln!(f, "  - {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EntryMismatch {}

impl RtlEntry {
    /// Compare with the ISS entry for the same step.
    pub fn compare_with_iss(
        &self,
        iss: &IssEntry,
        skip_wipe_data_check: bool,
    ) -> Result<(), EntryMismatch> {
        let config = CompareConfig::default().with_skip_wipe_data_check(skip_wipe_data_check);
        self.compare_with_iss_config(iss, &config)
    }

    pub fn compare_with_iss_config(
        &self,
        iss: &IssEntry,
        config: &CompareConfig,
    ) -> Result<(), EntryMismatch> {
        let problems = find_mismatches(self, iss, config);
        if problems.is_empty() {
            debug!(header = self.header(), "trace entries match");
            return Ok(());
        }

        warn!(
            rtl = self.header(),
            iss = iss.header(),
            count = problems.len(),
            "trace entry mismatch"
        );
        Err(EntryMismatch {
            rtl_header: self.header().to_string(),
            iss_header: iss.header().to_string(),
            problems,
        })
    }
}

/// Compare an RTL entry with an ISS entry. See [`RtlEntry::compare_with_iss`].
pub fn compare(
    rtl: &RtlEntry,
    iss: &IssEntry,
    skip_wipe_data_check: bool,
) -> Result<(), EntryMismatch> {
    rtl.compare_with_iss(iss, skip_wipe_data_check)
}

fn phases_agree(rtl: Phase, iss: Phase) -> bool {
    if rtl == Phase::Invalid || iss == Phase::Invalid {
        return false;
    }
    rtl == iss || phase::is_compatible(rtl, iss) || phase::is_compatible(iss, rtl)
}

fn find_mismatches(rtl: &RtlEntry, iss: &IssEntry, config: &CompareConfig) -> Vec<Mismatch> {
    let (rtl_phase, iss_phase) = (rtl.phase(), iss.phase());
    if !phases_agree(rtl_phase, iss_phase) {
        // Write maps of unrelated steps say nothing useful.
        return vec![Mismatch::PhaseMismatch {
            rtl_phase,
            iss_phase,
            rtl_header: rtl.header().to_string(),
            iss_header: iss.header().to_string(),
        }];
    }

    let mut problems = Vec::new();
    if config.check_headers && rtl_phase == iss_phase && rtl.header() != iss.header() {
        problems.push(Mismatch::HeaderMismatch {
            rtl_header: rtl.header().to_string(),
            iss_header: iss.header().to_string(),
        });
    }

    let ignore_values = config.skip_wipe_data_check && (rtl_phase.is_wipe() || iss_phase.is_wipe());
    let locations: BTreeSet<&str> = rtl
        .entry()
        .locations()
        .chain(iss.entry().locations())
        .collect();

    for location in locations {
        match (rtl.get_writes(location), iss.get_writes(location)) {
            (Some(rtl_lines), Some(iss_lines)) => {
                check_writes_compatible(
                    location,
                    rtl_lines,
                    iss_lines,
                    ignore_values,
                    &mut problems,
                );
            }
            (Some(lines), None) => problems.push(Mismatch::UnilateralWrite {
                side: Side::Rtl,
                location: location.to_string(),
                lines: lines.to_vec(),
            }),
            (None, Some(lines)) => problems.push(Mismatch::UnilateralWrite {
                side: Side::Iss,
                location: location.to_string(),
                lines: lines.to_vec(),
            }),
            (None, None) => {}
        }
    }
    problems
}

/// Compare the sequences for one location position by position.
fn check_writes_compatible(
    location: &str,
    rtl_lines: &[BodyLine],
    iss_lines: &[BodyLine],
    ignore_values: bool,
    problems: &mut Vec<Mismatch>,
) {
    if rtl_lines.len() != iss_lines.len() {
        problems.push(Mismatch::WriteCountMismatch {
            location: location.to_string(),
            rtl: rtl_lines.to_vec(),
            iss: iss_lines.to_vec(),
        });
        return;
    }

    for (index, (rtl, iss)) in rtl_lines.iter().zip(iss_lines).enumerate() {
        let same = if ignore_values {
            rtl.same_shape(iss)
        } else {
            rtl == iss
        };
        if !same {
            problems.push(Mismatch::ValueMismatch {
                location: location.to_string(),
                index,
                rtl: rtl.clone(),
                iss: iss.clone(),
            });
        }
    }
}
