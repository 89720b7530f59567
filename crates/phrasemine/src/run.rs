//! The load → mine → write pipeline behind the CLI.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument};

use phrasemine_core::cancel::CancelToken;
use phrasemine_core::config::{self, Config};
use phrasemine_core::corpus::{Corpus, CorpusLoader, LoaderOptions};
use phrasemine_core::engine::{self, EngineKind, MiningMode, MiningParams};
use phrasemine_core::output;
use phrasemine_core::phrase::Phrase;
use phrasemine_core::tree;

use crate::Cli;

/// Machine-readable run summary printed under `--json`.
#[derive(Serialize)]
struct RunSummary {
    documents: usize,
    vocabulary: usize,
    phrases: usize,
    cancelled: bool,
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree_nodes: Option<usize>,
}

/// Execute one mining run.
///
/// Flags win over config values, which win over built-in defaults.
#[instrument(name = "run", skip_all, fields(input = %cli.input))]
pub fn run(cli: Cli, config: &Config, stop: &CancelToken) -> anyhow::Result<()> {
    let min_docs = cli
        .min_docs
        .or(config.min_docs)
        .unwrap_or(config::DEFAULT_MIN_DOCS)
        .max(1);
    let min_len = cli
        .min_len
        .or(config.ngrams)
        .unwrap_or(config::DEFAULT_NGRAMS)
        .max(1);
    let engine = cli.engine.or(config.engine).unwrap_or(EngineKind::Gme);
    let mode = cli.mode.or(config.mode).unwrap_or(MiningMode::Closed);
    let output_path = cli
        .output
        .clone()
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| config::DEFAULT_OUTPUT.into());
    let mem_hint = cli.mem.or(config.mem).unwrap_or(0);
    if mem_hint > 0 {
        debug!(mem_hint, "memory hint recorded (advisory only)");
    }

    let opts = LoaderOptions {
        sampling: cli.sampling.or(config.sampling).unwrap_or(1.0),
        mask: cli
            .mask
            .clone()
            .or_else(|| config.mask.clone())
            .unwrap_or_default(),
        threads: cli.threads.or(config.threads).unwrap_or(0),
        in_memory: cli.in_mem || config.in_mem,
        max_cached_docs: cli
            .cache
            .or(config.cache)
            .unwrap_or(config::DEFAULT_CACHE_DOCS),
        preload: cli.preload || config.preload,
        csv_delimiter: parse_delimiter(cli.csv_delim.as_deref()),
        ..LoaderOptions::default()
    };

    let loader = CorpusLoader::new(opts);
    let mut corpus = load_input(&loader, &cli.input)?;
    // Both engines mine resident documents; on-disk loads spill during
    // encoding and materialize here.
    corpus
        .ensure_resident()
        .context("failed to materialize corpus")?;
    info!(
        documents = corpus.len(),
        vocabulary = corpus.dictionary().len(),
        engine = %engine,
        min_docs,
        min_len,
        "mining"
    );

    let params = MiningParams { min_docs, min_len };
    let mut phrases: Vec<Phrase> = Vec::new();
    match engine {
        EngineKind::Gme => engine::greedy::mine(corpus.docs(), &params, stop, &mut phrases),
        EngineKind::Prefixspan => {
            engine::prefixspan::mine(corpus.docs(), &params, mode, stop, &mut phrases)
        }
    }
    let cancelled = stop.is_cancelled();

    output::sort_for_output(&mut phrases);
    let file = File::create(output_path.as_std_path())
        .with_context(|| format!("cannot write {output_path}"))?;
    let mut writer = BufWriter::new(file);
    output::write_csv(&mut writer, &phrases, corpus.dictionary(), corpus.sources())
        .with_context(|| format!("cannot write {output_path}"))?;
    writer
        .flush()
        .with_context(|| format!("cannot write {output_path}"))?;

    let tree_nodes = if cli.tree || config.tree {
        Some(build_tree_outputs(&cli, config, &phrases, &corpus, min_len)?)
    } else {
        None
    };

    if cli.json {
        let summary = RunSummary {
            documents: corpus.len(),
            vocabulary: corpus.dictionary().len(),
            phrases: phrases.len(),
            cancelled,
            output: output_path.to_string(),
            tree_nodes,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} {} documents, {} distinct words",
        "Corpus:".cyan(),
        corpus.len(),
        corpus.dictionary().len(),
    );
    println!(
        "{} {} phrases -> {}",
        "Mined:".cyan(),
        phrases.len(),
        output_path,
    );
    if let Some(nodes) = tree_nodes {
        println!(
            "{} {} nodes -> {} + {}",
            "Tree:".cyan(),
            nodes,
            config::DEFAULT_TREE_CSV,
            config::DEFAULT_TREE_HTML,
        );
    }
    if cancelled {
        println!(
            "{} interrupted; partial results written",
            "Note:".yellow(),
        );
    }

    Ok(())
}

/// Post-process the mined result set into a phrase hierarchy: the enriched
/// CSV and the collapsible HTML tree view. Returns the node count.
fn build_tree_outputs(
    cli: &Cli,
    config: &Config,
    phrases: &[Phrase],
    corpus: &Corpus,
    min_len: usize,
) -> anyhow::Result<usize> {
    let records: Vec<tree::PhraseRecord> = phrases
        .iter()
        .map(|p| tree::PhraseRecord {
            phrase: output::phrase_text(p, corpus.dictionary()),
            freq: p.support,
            length: p.tokens.len(),
        })
        .collect();
    let nodes = tree::build_phrase_tree(&records, min_len);

    let tree_csv = Utf8PathBuf::from(config::DEFAULT_TREE_CSV);
    let file = File::create(tree_csv.as_std_path())
        .with_context(|| format!("cannot write {tree_csv}"))?;
    let mut writer = BufWriter::new(file);
    tree::write_tree_csv(&mut writer, &nodes)
        .with_context(|| format!("cannot write {tree_csv}"))?;
    writer
        .flush()
        .with_context(|| format!("cannot write {tree_csv}"))?;

    let limit = cli
        .tree_limit
        .or(config.tree_limit)
        .unwrap_or(config::DEFAULT_TREE_LIMIT);
    let html = tree::render_html(&nodes, limit).context("failed to render the phrase tree")?;
    std::fs::write(config::DEFAULT_TREE_HTML, html)
        .with_context(|| format!("cannot write {}", config::DEFAULT_TREE_HTML))?;

    info!(
        nodes = nodes.len(),
        limit,
        "phrase hierarchy written"
    );
    Ok(nodes.len())
}

/// Pick the loading strategy from the input path.
///
/// A regular file whose name mentions `.csv`, or lacks `.txt`, loads as a
/// CSV-like file; everything else goes through the directory scanner (which
/// also handles a single plain-text file).
fn load_input(loader: &CorpusLoader, input: &Utf8Path) -> anyhow::Result<Corpus> {
    let meta = std::fs::metadata(input.as_std_path())
        .with_context(|| format!("path does not exist: {input}"))?;
    let name = input.as_str();
    let corpus = if meta.is_file() && (name.contains(".csv") || !name.contains(".txt")) {
        loader.load_csv(input)?
    } else {
        loader.load_directory(input)?
    };
    Ok(corpus)
}

/// Resolve the `--csv-delim` value: `\t` and `\n` escapes, otherwise the
/// first byte; unset or empty keeps the comma.
fn parse_delimiter(raw: Option<&str>) -> u8 {
    match raw {
        None => b',',
        Some("\\t") => b'\t',
        Some("\\n") => b'\n',
        Some(s) => s.as_bytes().first().copied().unwrap_or(b','),
    }
}
