//! Shared data model for mined phrases.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Dense token id assigned by the dictionary in first-occurrence order.
pub type Token = u32;

/// One location of a phrase: token offset `pos` within document `doc_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Occurrence {
    /// Position of the document in corpus load order.
    pub doc_id: u32,
    /// Token offset of the phrase's first token.
    pub pos: u32,
}

/// A mined contiguous phrase.
///
/// Invariant: `support` equals the number of distinct `doc_id`s across
/// `occurrences`, and every occurrence satisfies
/// `docs[doc_id][pos + i] == tokens[i]` for the whole phrase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Phrase {
    /// Token ids in document order.
    pub tokens: Vec<Token>,
    /// Every location of the phrase, grouped by document.
    pub occurrences: Vec<Occurrence>,
    /// Number of distinct documents among the occurrences.
    pub support: u32,
}

/// Receives phrases in emission order.
///
/// Emission order is engine-defined but deterministic; sinks must not assume
/// any global sort (the result writer applies its own).
pub trait PhraseSink {
    /// Accept one fully built phrase. Phrases are never mutated after this.
    fn accept(&mut self, phrase: Phrase);
}

impl PhraseSink for Vec<Phrase> {
    fn accept(&mut self, phrase: Phrase) {
        self.push(phrase);
    }
}

/// Count distinct doc ids in an occurrence list grouped by document.
///
/// Loaders and engines keep occurrence lists in `(doc_id, pos)` order, so
/// equal doc ids are adjacent and one neighbour-comparing pass suffices.
pub(crate) fn distinct_docs(occurrences: &[Occurrence]) -> u32 {
    let mut count = 0u32;
    let mut last = None;
    for o in occurrences {
        if last != Some(o.doc_id) {
            count += 1;
            last = Some(o.doc_id);
        }
    }
    count
}
