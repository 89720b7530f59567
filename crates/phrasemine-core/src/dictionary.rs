//! Surface-form dictionary and integer encoding.
//!
//! [`Dictionary`] stores forward mappings in a `Vec<Arc<str>>` (O(1) index
//! lookup, zero hashing) and reverse mappings in a `HashMap<Arc<str>, Token>`
//! (single hash lookup). The `Arc<str>` is shared between both structures, so
//! each surface form is allocated once.
//!
//! [`Encoder`] wraps a dictionary during loading and maintains the per-token
//! document-frequency side-table. Both are read-only once loading finishes.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::phrase::Token;

/// Insert-only bijection between surface forms and dense token ids.
///
/// Ids are assigned in first-occurrence order starting at 0, so encoding is
/// deterministic given the input order.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<Arc<str>>,
    reverse: HashMap<Arc<str>, Token>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or assign the id for `surface`.
    pub fn intern(&mut self, surface: &str) -> Token {
        if let Some(&id) = self.reverse.get(surface) {
            return id;
        }
        let id = self.entries.len() as Token;
        let interned: Arc<str> = Arc::from(surface);
        self.entries.push(Arc::clone(&interned));
        self.reverse.insert(interned, id);
        id
    }

    /// Reverse lookup: find the id of a surface form already interned.
    #[inline]
    pub fn find(&self, surface: &str) -> Option<Token> {
        self.reverse.get(surface).copied()
    }

    /// Forward lookup: resolve an id to its surface form. O(1) Vec index.
    #[inline]
    pub fn resolve(&self, id: Token) -> Option<&str> {
        self.entries.get(id as usize).map(|s| &**s)
    }

    /// Number of distinct surface forms.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no surface form has been interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over `(id, surface)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, s)| (i as Token, &**s))
    }
}

/// Encodes documents and counts per-token document frequency.
///
/// DF is incremented at most once per document by keeping a "last document
/// seen" stamp per token, stored as `doc_index + 1` so the 0 sentinel means
/// "never seen". DF is reporting data for collaborators, not a mining filter.
#[derive(Debug, Default)]
pub struct Encoder {
    dictionary: Dictionary,
    doc_freq: Vec<u32>,
    last_seen: Vec<u32>,
}

impl Encoder {
    /// Create an encoder with an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one document's words, in corpus load order.
    ///
    /// `doc_index` is the document's position in the load order; it must be
    /// strictly increasing across calls for the DF stamps to be correct.
    pub fn encode(&mut self, doc_index: u32, words: &[String]) -> Vec<Token> {
        let stamp = doc_index + 1;
        let mut encoded = Vec::with_capacity(words.len());
        for word in words {
            let id = self.dictionary.intern(word);
            let slot = id as usize;
            if slot == self.doc_freq.len() {
                self.doc_freq.push(0);
                self.last_seen.push(0);
            }
            encoded.push(id);
            if self.last_seen[slot] != stamp {
                self.doc_freq[slot] += 1;
                self.last_seen[slot] = stamp;
            }
        }
        encoded
    }

    /// Finish loading, dropping the stamp table.
    pub fn finish(self) -> (Dictionary, Vec<u32>) {
        (self.dictionary, self.doc_freq)
    }
}
