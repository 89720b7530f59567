//! Greedy maximal extension mining.
//!
//! Every contiguous L-gram in the corpus seeds a candidate bucket. Buckets
//! frequent in at least `min_docs` documents are walked in support order,
//! each extended one token rightward at a time while consumed positions are
//! marked, so later overlapping candidates are skipped (path compression).
//! Extension is greedy; the engine never backtracks.

use hashbrown::HashMap;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::engine::MiningParams;
use crate::phrase::{Occurrence, Phrase, PhraseSink, Token, distinct_docs};

/// Per-document bitmap of positions consumed by accepted phrases.
struct ProcessedMap {
    bits: Vec<Vec<u64>>,
}

impl ProcessedMap {
    fn new(docs: &[Vec<Token>]) -> Self {
        Self {
            bits: docs.iter().map(|d| vec![0u64; d.len().div_ceil(64)]).collect(),
        }
    }

    fn is_marked(&self, doc_id: u32, pos: u32) -> bool {
        self.bits[doc_id as usize][(pos / 64) as usize] >> (pos % 64) & 1 == 1
    }

    fn mark(&mut self, doc_id: u32, pos: u32) {
        self.bits[doc_id as usize][(pos / 64) as usize] |= 1 << (pos % 64);
    }
}

/// Mine `docs`, delivering phrases to `sink` in support-descending candidate
/// order.
///
/// The stop token is polled between candidates only, never mid-extension.
#[tracing::instrument(skip_all, fields(min_docs = params.min_docs, min_len = params.min_len))]
pub fn mine(
    docs: &[Vec<Token>],
    params: &MiningParams,
    stop: &CancelToken,
    sink: &mut dyn PhraseSink,
) {
    let seeds = gather_seeds(docs, params.min_len);
    let mut candidates = filter_seeds(seeds, params.min_docs);

    // Support descending; ties broken by ascending token sequence so the
    // walk order is independent of hash iteration.
    candidates.sort_unstable_by(|a, b| {
        b.support
            .cmp(&a.support)
            .then_with(|| a.tokens.cmp(&b.tokens))
    });
    debug!(candidates = candidates.len(), "candidates after support filter");

    let mut processed = ProcessedMap::new(docs);
    let mut emitted = 0usize;
    for mut cand in candidates {
        if stop.is_cancelled() {
            debug!(emitted, "stop requested, returning partial results");
            return;
        }

        // Coarse freshness gate: only start positions are consulted, so the
        // non-overlap guarantee covers starts, not whole spans.
        if cand
            .occurrences
            .iter()
            .all(|o| processed.is_marked(o.doc_id, o.pos))
        {
            continue;
        }

        extend(docs, &mut cand, params.min_docs);

        for o in &cand.occurrences {
            let end = (o.pos as usize + cand.tokens.len()).min(docs[o.doc_id as usize].len());
            for pos in o.pos as usize..end {
                processed.mark(o.doc_id, pos as u32);
            }
        }

        emitted += 1;
        sink.accept(cand);
    }
    debug!(emitted, "greedy mining complete");
}

/// Bucket every contiguous `len`-gram by its full token sequence.
fn gather_seeds(docs: &[Vec<Token>], len: usize) -> HashMap<Vec<Token>, Vec<Occurrence>> {
    let mut seeds: HashMap<Vec<Token>, Vec<Occurrence>> = HashMap::new();
    for (doc_id, doc) in docs.iter().enumerate() {
        if doc.len() < len {
            continue;
        }
        for pos in 0..=doc.len() - len {
            seeds
                .entry(doc[pos..pos + len].to_vec())
                .or_default()
                .push(Occurrence {
                    doc_id: doc_id as u32,
                    pos: pos as u32,
                });
        }
    }
    seeds
}

/// Drop buckets below the support floor; survivors become candidates.
fn filter_seeds(
    seeds: HashMap<Vec<Token>, Vec<Occurrence>>,
    min_docs: u32,
) -> Vec<Phrase> {
    seeds
        .into_iter()
        .filter_map(|(tokens, occurrences)| {
            let support = distinct_docs(&occurrences);
            (support >= min_docs).then_some(Phrase {
                tokens,
                occurrences,
                support,
            })
        })
        .collect()
}

/// Repeatedly extend `cand` one token rightward while some next token keeps
/// support at or above `min_docs`.
///
/// On equal maximal support the smallest token id wins, so the choice is
/// independent of hash iteration order.
fn extend(docs: &[Vec<Token>], cand: &mut Phrase, min_docs: u32) {
    loop {
        let mut next: HashMap<Token, Vec<Occurrence>> = HashMap::new();
        for o in &cand.occurrences {
            let doc = &docs[o.doc_id as usize];
            let np = o.pos as usize + cand.tokens.len();
            if np < doc.len() {
                next.entry(doc[np]).or_default().push(*o);
            }
        }

        let mut best: Option<(Token, u32)> = None;
        for (&word, occs) in &next {
            let support = distinct_docs(occs);
            if support < min_docs {
                continue;
            }
            let better = match best {
                None => true,
                Some((bw, bs)) => support > bs || (support == bs && word < bw),
            };
            if better {
                best = Some((word, support));
            }
        }

        let Some((word, support)) = best else { break };
        let Some(occurrences) = next.remove(&word) else {
            break;
        };
        cand.tokens.push(word);
        cand.occurrences = occurrences;
        cand.support = support;
    }
}
