//! Error types for parsing and stream checking.
//!
//! Mismatches between an RTL and an ISS entry are not errors in this sense:
//! they are ordinary values, see [`crate::compare`].

use thiserror::Error;

use crate::compare::Side;

/// Errors produced while turning trace text into entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{origin}: malformed trace line `{line}`: {reason}")]
    MalformedLine {
        origin: String,
        line: String,
        reason: &'static str,
    },
    #[error("{origin}: malformed trace entry: {reason}\n{block}")]
    MalformedBlock {
        origin: String,
        block: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Merging failed because one of the operands never classified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot merge invalid trace entry `{header}`")]
pub struct MergeError {
    pub header: String,
}

/// Errors from [`crate::TraceChecker`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("{side} trace entry has an unknown header: `{header}`")]
    InvalidEntry { side: Side, header: String },
    #[error("{side} trace entry `{next}` cannot follow `{previous}`")]
    Sequence {
        side: Side,
        previous: String,
        next: String,
    },
    #[error("unmatched entries at end of trace: RTL {rtl}, ISS {iss}")]
    Unpaired { rtl: usize, iss: usize },
}
