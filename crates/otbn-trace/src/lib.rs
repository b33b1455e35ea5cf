//! OTBN trace cross-checking.
//!
//! Parses the per-cycle traces emitted by the OTBN RTL and by the
//! instruction-set simulator, merges multi-cycle stalls and secure wipes into
//! logical steps, and compares each RTL step with the matching ISS step.
//!
//! # Example
//!
//! ```
//! use otbn_trace::{IssEntry, RtlEntry};
//!
//! let rtl = RtlEntry::parse("E PC: 0x00000000, insn: 0x00500093\n> x1: 0x00000005")?;
//! let iss = IssEntry::parse(&[
//!     "# @0x00000000: addi",
//!     "E PC: 0x00000000, insn: 0x00500093",
//!     "> x1: 0x00000005",
//! ])?;
//! assert!(rtl.compare_with_iss(&iss, false).is_ok());
//! # Ok::<(), otbn_trace::ParseError>(())
//! ```
//!
//! Feeding whole traces goes through [`TraceChecker`], which does the
//! merging and pairing.

pub mod checker;
pub mod compare;
pub mod entry;
pub mod error;
pub mod line;
pub mod phase;

pub use checker::{CheckSummary, CheckerConfig, StepReport, TraceChecker};
pub use compare::{CompareConfig, EntryMismatch, Mismatch, Side, compare};
pub use entry::{Entry, IssData, IssEntry, RtlEntry, TraceEntry};
pub use error::{CheckError, MergeError, ParseError, Result};
pub use line::{BodyLine, LineKind};
pub use phase::{Phase, PhaseVocabulary, classify, is_compatible};
