//! Result serialization.
//!
//! Phrases are sorted by support descending, then length descending, and
//! written as CSV with the header `phrase,freq,length,example_files`. Every
//! field is double-quote wrapped and embedded quotes are doubled — the
//! tokenizer cannot produce a quote in a surface form, but the writer does
//! not rely on that.

use std::io::{self, Write};

use tracing::debug;

use crate::dictionary::Dictionary;
use crate::phrase::Phrase;

/// How many example sources are listed per row before truncation.
const EXAMPLE_LIMIT: usize = 2;

/// Order phrases for output: support descending, then length descending.
///
/// The sort is stable, so the engine's deterministic emission order breaks
/// any remaining ties.
pub fn sort_for_output(phrases: &mut [Phrase]) {
    phrases.sort_by(|a, b| {
        b.support
            .cmp(&a.support)
            .then_with(|| b.tokens.len().cmp(&a.tokens.len()))
    });
}

/// Render a phrase's token ids back to space-joined surface text.
pub fn phrase_text(phrase: &Phrase, dictionary: &Dictionary) -> String {
    let mut text = String::new();
    for &token in &phrase.tokens {
        if let Some(surface) = dictionary.resolve(token) {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(surface);
        }
    }
    text
}

/// Write the sorted result set as CSV.
#[tracing::instrument(skip_all, fields(phrases = phrases.len()))]
pub fn write_csv<W: Write>(
    mut out: W,
    phrases: &[Phrase],
    dictionary: &Dictionary,
    sources: &[String],
) -> io::Result<()> {
    writeln!(out, "phrase,freq,length,example_files")?;
    for phrase in phrases {
        writeln!(
            out,
            "{},{},{},{}",
            quote_field(&phrase_text(phrase, dictionary)),
            phrase.support,
            phrase.tokens.len(),
            quote_field(&example_files(phrase, sources)),
        )?;
    }
    debug!("result CSV written");
    Ok(())
}

/// Up to two distinct example sources in occurrence order, with `...`
/// appended when more documents exist.
fn example_files(phrase: &Phrase, sources: &[String]) -> String {
    let mut picked_docs: Vec<u32> = Vec::new();
    let mut truncated = false;
    for o in &phrase.occurrences {
        if picked_docs.contains(&o.doc_id) {
            continue;
        }
        if picked_docs.len() == EXAMPLE_LIMIT {
            truncated = true;
            break;
        }
        picked_docs.push(o.doc_id);
    }

    let mut text = picked_docs
        .iter()
        .filter_map(|&d| sources.get(d as usize).map(String::as_str))
        .collect::<Vec<_>>()
        .join("|");
    if truncated {
        text.push_str("...");
    }
    text
}

/// Wrap a field in double quotes, doubling any embedded quotes.
pub(crate) fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
