//! Contiguous PrefixSpan mining.
//!
//! Depth-first search over projected databases. A projection entry records
//! where the current prefix's match began (`origin`) and the continuation
//! point one past its end (`pos`); children advance `pos` by exactly one, so
//! no gap can open between the prefix and its next token. Requires a fully
//! resident corpus.

use hashbrown::HashMap;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::engine::{MiningMode, MiningParams};
use crate::phrase::{Occurrence, Phrase, PhraseSink, Token};

/// One continuation point of the current prefix.
#[derive(Debug, Clone, Copy)]
struct Projection {
    doc_id: u32,
    pos: u32,
    origin: u32,
}

/// Mine `docs` depth-first, delivering phrases to `sink` in DFS order with
/// siblings visited by ascending token id.
///
/// The stop token is polled at every recursive entry; tripping it discards
/// in-flight subtrees but keeps already-emitted phrases.
#[tracing::instrument(skip_all, fields(min_docs = params.min_docs, min_len = params.min_len, mode = %mode))]
pub fn mine(
    docs: &[Vec<Token>],
    params: &MiningParams,
    mode: MiningMode,
    stop: &CancelToken,
    sink: &mut dyn PhraseSink,
) {
    let mut db = Vec::new();
    let mut initial_support = 0u32;
    for (doc_id, doc) in docs.iter().enumerate() {
        if doc.is_empty() {
            continue;
        }
        initial_support += 1;
        for pos in 0..doc.len() as u32 {
            db.push(Projection {
                doc_id: doc_id as u32,
                pos,
                origin: pos,
            });
        }
    }
    debug!(
        projections = db.len(),
        documents = initial_support,
        "initial database built"
    );

    let mut miner = Miner {
        docs,
        params,
        mode,
        stop,
        sink,
    };
    let mut prefix = Vec::new();
    miner.descend(&db, &[], &mut prefix, initial_support);
}

struct Miner<'a> {
    docs: &'a [Vec<Token>],
    params: &'a MiningParams,
    mode: MiningMode,
    stop: &'a CancelToken,
    sink: &'a mut dyn PhraseSink,
}

impl Miner<'_> {
    fn descend(
        &mut self,
        db: &[Projection],
        occurrences: &[Occurrence],
        prefix: &mut Vec<Token>,
        support: u32,
    ) {
        if self.stop.is_cancelled() {
            return;
        }

        // Occurrence delivery: distinct-doc support per extension token.
        // Entries in `db` stay grouped by document, so a push-if-differs on
        // the per-token doc list counts each document once. The map is
        // per-call state; nothing survives between recursive entries.
        let mut extensions: HashMap<Token, Vec<u32>> = HashMap::new();
        for proj in db {
            let doc = &self.docs[proj.doc_id as usize];
            if (proj.pos as usize) < doc.len() {
                let seen = extensions.entry(doc[proj.pos as usize]).or_default();
                if seen.last() != Some(&proj.doc_id) {
                    seen.push(proj.doc_id);
                }
            }
        }

        let mut frequent: Vec<(Token, u32)> = extensions
            .iter()
            .map(|(&word, docs_seen)| (word, docs_seen.len() as u32))
            .filter(|&(_, s)| s >= self.params.min_docs)
            .collect();
        frequent.sort_unstable_by_key(|&(word, _)| word);

        if prefix.len() >= self.params.min_len && self.should_emit(&frequent, support) {
            self.sink.accept(Phrase {
                tokens: prefix.clone(),
                occurrences: occurrences.to_vec(),
                support,
            });
        }

        for &(word, word_support) in &frequent {
            let mut child_db = Vec::new();
            let mut child_occs = Vec::new();
            for proj in db {
                let doc = &self.docs[proj.doc_id as usize];
                let pos = proj.pos as usize;
                if pos < doc.len() && doc[pos] == word {
                    child_occs.push(Occurrence {
                        doc_id: proj.doc_id,
                        pos: proj.origin,
                    });
                    // Matches ending at a document boundary stay in the
                    // occurrence set but have no continuation point.
                    if pos + 1 < doc.len() {
                        child_db.push(Projection {
                            doc_id: proj.doc_id,
                            pos: proj.pos + 1,
                            origin: proj.origin,
                        });
                    }
                }
            }
            prefix.push(word);
            self.descend(&child_db, &child_occs, prefix, word_support);
            prefix.pop();
        }
    }

    fn should_emit(&self, frequent: &[(Token, u32)], support: u32) -> bool {
        match self.mode {
            MiningMode::All => true,
            MiningMode::Maximal => frequent.is_empty(),
            MiningMode::Closed => !frequent.iter().any(|&(_, s)| s == support),
        }
    }
}
