//! Execution phases and the header vocabulary that selects them.

use std::fmt;
use std::sync::OnceLock;

/// Role an entry plays in the execution of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Header did not match the vocabulary.
    Invalid,
    Stall,
    Exec,
    WipeInProgress,
    WipeComplete,
}

impl Phase {
    /// Stall or WipeInProgress: more cycles of the same step follow.
    #[must_use]
    pub const fn is_partial(self) -> bool {
        matches!(self, Self::Stall | Self::WipeInProgress)
    }

    /// Exec or WipeComplete: the entry closes a step.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Exec | Self::WipeComplete)
    }

    #[must_use]
    pub const fn is_wipe(self) -> bool {
        matches!(self, Self::WipeInProgress | Self::WipeComplete)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid"),
            Self::Stall => write!(f, "stall"),
            Self::Exec => write!(f, "exec"),
            Self::WipeInProgress => write!(f, "wipe in progress"),
            Self::WipeComplete => write!(f, "wipe complete"),
        }
    }
}

/// True if an entry of phase `successor` may continue one of phase
/// `predecessor`.
///
/// A run of stalls ends in one exec and a run of wipe cycles ends in one
/// wipe-complete. Nothing may follow a final or invalid entry.
#[must_use]
pub const fn is_compatible(predecessor: Phase, successor: Phase) -> bool {
    match predecessor {
        Phase::Stall => matches!(successor, Phase::Stall | Phase::Exec),
        Phase::WipeInProgress => {
            matches!(successor, Phase::WipeInProgress | Phase::WipeComplete)
        }
        Phase::Invalid | Phase::Exec | Phase::WipeComplete => false,
    }
}

/// Table from header tags to phases.
///
/// A header is classified by its first whitespace-separated token, which
/// must exactly equal one of the tags. The default table is the one used by
/// the OTBN tracers:
///
/// | tag | phase            |
/// |-----|------------------|
/// | `S` | stall            |
/// | `E` | exec             |
/// | `U` | wipe in progress |
/// | `V` | wipe complete    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseVocabulary {
    tags: Vec<(String, Phase)>,
}

impl PhaseVocabulary {
    /// An empty table: every header classifies as [`Phase::Invalid`].
    #[must_use]
    pub const fn empty() -> Self {
        Self { tags: Vec::new() }
    }

    /// Add (or replace) a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>, phase: Phase) -> Self {
        let tag = tag.into();
        if let Some(slot) = self.tags.iter_mut().find(|(t, _)| *t == tag) {
            slot.1 = phase;
        } else {
            self.tags.push((tag, phase));
        }
        self
    }

    /// Classify a header. Never fails; unknown headers are `Invalid`.
    #[must_use]
    pub fn classify(&self, header: &str) -> Phase {
        let Some(tag) = header.split_whitespace().next() else {
            return Phase::Invalid;
        };
        self.tags
            .iter()
            .find(|(t, _)| t == tag)
            .map_or(Phase::Invalid, |&(_, phase)| phase)
    }

    /// The header with its leading tag removed.
    ///
    /// Consecutive stall cycles of one instruction share this part.
    #[must_use]
    pub fn strip_tag(header: &str) -> &str {
        let header = header.trim_start();
        header
            .find(char::is_whitespace)
            .map_or("", |end| header[end..].trim())
    }
}

impl Default for PhaseVocabulary {
    fn default() -> Self {
        Self::empty()
            .with_tag("S", Phase::Stall)
            .with_tag("E", Phase::Exec)
            .with_tag("U", Phase::WipeInProgress)
            .with_tag("V", Phase::WipeComplete)
    }
}

/// Classify a header against the default vocabulary.
#[must_use]
pub fn classify(header: &str) -> Phase {
    default_vocabulary().classify(header)
}

pub(crate) fn default_vocabulary() -> &'static PhaseVocabulary {
    static DEFAULT: OnceLock<PhaseVocabulary> = OnceLock::new();
    DEFAULT.get_or_init(PhaseVocabulary::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 5] = [
        Phase::Invalid,
        Phase::Stall,
        Phase::Exec,
        Phase::WipeInProgress,
        Phase::WipeComplete,
    ];

    #[test]
    fn test_classify_default_tags() {
        assert_eq!(classify("S PC: 0x00000010, insn: 0x00000000"), Phase::Stall);
        assert_eq!(classify("E PC: 0x00000010, insn: 0x0040006f"), Phase::Exec);
        assert_eq!(classify("U"), Phase::WipeInProgress);
        assert_eq!(classify("V"), Phase::WipeComplete);
    }

    #[test]
    fn test_classify_unknown_is_invalid() {
        assert_eq!(classify(""), Phase::Invalid);
        assert_eq!(classify("   "), Phase::Invalid);
        assert_eq!(classify("X PC: 0x0"), Phase::Invalid);
        // Tags match whole tokens only.
        assert_eq!(classify("EXEC PC: 0x0"), Phase::Invalid);
        assert_eq!(classify("e PC: 0x0"), Phase::Invalid);
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocab = PhaseVocabulary::empty()
            .with_tag("STALL", Phase::Stall)
            .with_tag("EXEC", Phase::Exec)
            .with_tag("EXEC", Phase::WipeComplete);
        assert_eq!(vocab.classify("STALL @4"), Phase::Stall);
        assert_eq!(vocab.classify("EXEC @4"), Phase::WipeComplete);
        assert_eq!(vocab.classify("E @4"), Phase::Invalid);
    }

    #[test]
    fn test_partial_and_final() {
        for phase in ALL {
            assert!(!(phase.is_partial() && phase.is_final()));
        }
        assert!(Phase::Stall.is_partial());
        assert!(Phase::WipeInProgress.is_partial());
        assert!(Phase::Exec.is_final());
        assert!(Phase::WipeComplete.is_final());
        assert!(!Phase::Invalid.is_partial());
        assert!(!Phase::Invalid.is_final());
    }

    #[test]
    fn test_compatibility_relation() {
        let allowed = [
            (Phase::Stall, Phase::Stall),
            (Phase::Stall, Phase::Exec),
            (Phase::WipeInProgress, Phase::WipeInProgress),
            (Phase::WipeInProgress, Phase::WipeComplete),
        ];
        for pred in ALL {
            for succ in ALL {
                assert_eq!(
                    is_compatible(pred, succ),
                    allowed.contains(&(pred, succ)),
                    "{pred} -> {succ}"
                );
            }
        }
    }

    #[test]
    fn test_strip_tag() {
        assert_eq!(
            PhaseVocabulary::strip_tag("S PC: 0x00000010, insn: 0x00000000"),
            "PC: 0x00000010, insn: 0x00000000"
        );
        assert_eq!(PhaseVocabulary::strip_tag("U"), "");
        assert_eq!(PhaseVocabulary::strip_tag(""), "");
    }
}
