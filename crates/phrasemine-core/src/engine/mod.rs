//! Mining engines.
//!
//! Two interchangeable back-ends consume the encoded corpus and emit
//! `(phrase, support, occurrences)` records through a [`PhraseSink`]:
//! [`greedy`] seeds contiguous L-grams and extends them under a
//! path-compression policy; [`prefixspan`] walks projected databases
//! depth-first and supports ALL / CLOSED / MAXIMAL output filtering.
//!
//! [`PhraseSink`]: crate::phrase::PhraseSink

use serde::{Deserialize, Serialize};

pub mod greedy;
pub mod prefixspan;

/// Thresholds shared by both engines.
#[derive(Debug, Clone, Copy)]
pub struct MiningParams {
    /// Minimum number of distinct documents a phrase must appear in.
    pub min_docs: u32,
    /// Minimum phrase length; also the seed length for the greedy engine.
    /// Must be at least 1.
    pub min_len: usize,
}

/// Output filter for the PrefixSpan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum MiningMode {
    /// Every frequent pattern of sufficient length.
    All,
    /// Patterns with no single-token forward extension of equal support
    /// (forward-closed; backward closure is not considered).
    Closed,
    /// Patterns with no frequent single-token forward extension.
    Maximal,
}

impl MiningMode {
    /// Lowercase name as used on the command line and in config files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Closed => "closed",
            Self::Maximal => "maximal",
        }
    }
}

impl std::fmt::Display for MiningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mining back-end selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum EngineKind {
    /// Greedy maximal extension with path compression.
    Gme,
    /// Contiguous PrefixSpan.
    Prefixspan,
}

impl EngineKind {
    /// Lowercase name as used on the command line and in config files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gme => "gme",
            Self::Prefixspan => "prefixspan",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
