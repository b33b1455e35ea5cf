//! Pairing the RTL and ISS entry streams.
//!
//! Both simulators report every cycle, but stalls and secure wipes can take
//! a different number of cycles on each side. Each stream merges its partial
//! entries until a final one arrives, and completed steps are compared in
//! order as soon as both sides have one.
//!
//! The checker holds mutable state and is not synchronised: producers on
//! other threads must hand their entries to a single owner.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::compare::{CompareConfig, EntryMismatch, Side};
use crate::entry::{IssEntry, RtlEntry, TraceEntry};
use crate::error::CheckError;
use crate::phase::{Phase, PhaseVocabulary};

/// Configuration for a [`TraceChecker`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerConfig {
    pub compare: CompareConfig,
    pub vocabulary: PhaseVocabulary,
}

impl CheckerConfig {
    #[must_use]
    pub fn with_skip_wipe_data_check(mut self, skip: bool) -> Self {
        self.compare.skip_wipe_data_check = skip;
        self
    }

    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: PhaseVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }
}

/// Result of comparing one completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Zero-based index of the step in the traces.
    pub index: usize,
    pub instruction_address: u32,
    pub mnemonic: String,
    pub outcome: Result<(), EntryMismatch>,
}

impl StepReport {
    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Totals once both traces have been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub matched: usize,
    pub mismatched: usize,
}

impl CheckSummary {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.mismatched == 0
    }
}

/// One side's entries: at most one partial step being accumulated, and the
/// steps completed but not yet compared.
#[derive(Debug)]
struct Stream<T> {
    side: Side,
    pending: Option<T>,
    ready: VecDeque<T>,
}

impl<T: TraceEntry> Stream<T> {
    const fn new(side: Side) -> Self {
        Self {
            side,
            pending: None,
            ready: VecDeque::new(),
        }
    }

    fn accept(&mut self, entry: T) -> Result<(), CheckError> {
        if entry.phase() == Phase::Invalid {
            return Err(CheckError::InvalidEntry {
                side: self.side,
                header: entry.header().to_string(),
            });
        }

        // A rejected entry is dropped and the pending step stays outstanding.
        if let Some(previous) = &self.pending {
            if !entry.entry().continues(previous.entry()) {
                return Err(CheckError::Sequence {
                    side: self.side,
                    previous: previous.header().to_string(),
                    next: entry.header().to_string(),
                });
            }
        }

        let entry = match self.pending.take() {
            Some(previous) => entry.merge(previous, true)?,
            None => entry,
        };

        if entry.is_partial() {
            self.pending = Some(entry);
        } else {
            debug!(side = %self.side, header = entry.header(), "step complete");
            self.ready.push_back(entry);
        }
        Ok(())
    }

    fn outstanding(&self) -> usize {
        self.ready.len() + usize::from(self.pending.is_some())
    }
}

/// Cross-checks an RTL trace against an ISS trace, entry by entry.
#[derive(Debug)]
pub struct TraceChecker {
    config: CheckerConfig,
    rtl: Stream<RtlEntry>,
    iss: Stream<IssEntry>,
    summary: CheckSummary,
}

impl TraceChecker {
    #[must_use]
    pub const fn new(config: CheckerConfig) -> Self {
        Self {
            config,
            rtl: Stream::new(Side::Rtl),
            iss: Stream::new(Side::Iss),
            summary: CheckSummary {
                matched: 0,
                mismatched: 0,
            },
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Feed one RTL block. Returns reports for any steps this completed.
    pub fn push_rtl(&mut self, block: &str) -> Result<Vec<StepReport>, CheckError> {
        let entry = RtlEntry::parse_with(block, &self.config.vocabulary)?;
        self.push_rtl_entry(entry)
    }

    /// Feed the lines of one ISS entry.
    pub fn push_iss<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<Vec<StepReport>, CheckError> {
        let entry = IssEntry::parse_with(lines, &self.config.vocabulary)?;
        self.push_iss_entry(entry)
    }

    pub fn push_rtl_entry(&mut self, entry: RtlEntry) -> Result<Vec<StepReport>, CheckError> {
        self.rtl.accept(entry)?;
        Ok(self.drain())
    }

    pub fn push_iss_entry(&mut self, entry: IssEntry) -> Result<Vec<StepReport>, CheckError> {
        self.iss.accept(entry)?;
        Ok(self.drain())
    }

    /// Totals so far.
    #[must_use]
    pub const fn summary(&self) -> CheckSummary {
        self.summary
    }

    /// Finish checking. Fails if either trace has entries the other never
    /// matched, counting both sides.
    pub fn finish(self) -> Result<CheckSummary, CheckError> {
        let (rtl, iss) = (self.rtl.outstanding(), self.iss.outstanding());
        if rtl > 0 || iss > 0 {
            return Err(CheckError::Unpaired { rtl, iss });
        }
        Ok(self.summary)
    }

    fn drain(&mut self) -> Vec<StepReport> {
        let mut reports = Vec::new();
        while !self.rtl.ready.is_empty() && !self.iss.ready.is_empty() {
            let (Some(rtl), Some(iss)) = (self.rtl.ready.pop_front(), self.iss.ready.pop_front())
            else {
                break;
            };

            let index = self.summary.matched + self.summary.mismatched;
            let outcome = rtl.compare_with_iss_config(&iss, &self.config.compare);
            match &outcome {
                Ok(()) => self.summary.matched += 1,
                Err(mismatch) => {
                    warn!(
                        step = index,
                        addr = %format!("{:#010x}", iss.instruction_address()),
                        mnemonic = iss.mnemonic(),
                        "{mismatch}"
                    );
                    self.summary.mismatched += 1;
                }
            }

            let (_, data) = iss.into_parts();
            reports.push(StepReport {
                index,
                instruction_address: data.instruction_address,
                mnemonic: data.mnemonic,
                outcome,
            });
        }
        reports
    }
}

impl Default for TraceChecker {
    fn default() -> Self {
        Self::new(CheckerConfig::default())
    }
}
