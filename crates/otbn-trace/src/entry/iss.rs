use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MergeError, ParseError, Result};
use crate::line::BodyLine;
use crate::phase::{PhaseVocabulary, default_vocabulary};

use super::{Entry, TraceEntry};

const ORIGIN: &str = "ISS";

/// Fields taken from the ISS metadata line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssData {
    pub instruction_address: u32,
    pub mnemonic: String,
}

/// An entry from the ISS.
///
/// ISS entries look like RTL ones with an extra metadata line in front:
///
/// ```text
/// # @0x00000004: addi
/// E PC: 0x00000004, insn: 0x00100093
/// > x1: 0x00000001
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssEntry {
    entry: Entry,
    data: IssData,
}

impl IssEntry {
    /// Parse the lines of one entry using the default header vocabulary.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        Self::parse_with(lines, default_vocabulary())
    }

    pub fn parse_with<S: AsRef<str>>(lines: &[S], vocabulary: &PhaseVocabulary) -> Result<Self> {
        let malformed = |reason: String| ParseError::MalformedBlock {
            origin: ORIGIN.to_string(),
            block: lines
                .iter()
                .map(|l| l.as_ref())
                .collect::<Vec<&str>>()
                .join("\n"),
            reason,
        };

        let mut lines_iter = lines
            .iter()
            .map(|l| l.as_ref().trim_end())
            .filter(|l| !l.trim().is_empty());

        let special = lines_iter
            .next()
            .ok_or_else(|| malformed("empty trace entry".to_string()))?;
        let data = parse_metadata(special).ok_or_else(|| {
            malformed(format!("bad metadata line for ISS trace entry: `{special}`"))
        })?;
        let header = lines_iter
            .next()
            .ok_or_else(|| malformed("missing header line".to_string()))?;

        let body = lines_iter
            .map(|line| BodyLine::parse(ORIGIN, line))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| malformed(err.to_string()))?;

        Ok(Self {
            entry: Entry::new(header, body, vocabulary),
            data,
        })
    }

    #[must_use]
    pub const fn data(&self) -> &IssData {
        &self.data
    }

    #[must_use]
    pub const fn instruction_address(&self) -> u32 {
        self.data.instruction_address
    }

    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.data.mnemonic
    }

    #[must_use]
    pub fn into_parts(self) -> (Entry, IssData) {
        (self.entry, self.data)
    }
}

impl TraceEntry for IssEntry {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn merge(self, other: Self, other_first: bool) -> std::result::Result<Self, MergeError> {
        let data = if other_first { self.data } else { other.data };
        let entry = self.entry.merge(other.entry, other_first)?;
        Ok(Self { entry, data })
    }
}

impl fmt::Display for IssEntry {
    /// Metadata line, then the entry; the output parses back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# @0x{:08x}: {}",
            self.data.instruction_address, self.data.mnemonic
        )?;
        fmt::Display::fmt(&self.entry, f)
    }
}

/// Parse `# @0x<ADDR>: <MNEMONIC>`.
fn parse_metadata(line: &str) -> Option<IssData> {
    let caps = metadata_pattern().captures(line)?;
    let instruction_address = u32::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
    let mnemonic = caps.get(2)?.as_str().trim().to_string();
    Some(IssData {
        instruction_address,
        mnemonic,
    })
}

fn metadata_pattern() -> &'static Regex {
    METADATA_PATTERN.get_or_init(|| {
        Regex::new(r"^# @0x([0-9a-fA-F]{8}): (\S.*)$").expect("valid metadata regex")
    })
}

static METADATA_PATTERN: OnceLock<Regex> = OnceLock::new();
