//! Library interface for the `phrasemine` CLI.
//!
//! This crate exposes the CLI's argument parser and the run pipeline as a
//! library, primarily for documentation generation and testing. The actual
//! entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`run`] - The load → mine → write pipeline

pub mod run;

use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use phrasemine_core::engine::{EngineKind, MiningMode};

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Apply the choice process-wide, before anything is printed.
    pub fn apply(self) {
        let force = match self {
            // No override; owo-colors falls back to its own terminal probe.
            Self::Auto => return,
            Self::Always => true,
            Self::Never => false,
        };
        owo_colors::set_override(force);
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG               Log filter (e.g., debug, phrasemine=trace)
    PHRASEMINE_MIN_DOCS    Config override for the document-frequency floor
    PHRASEMINE_ENGINE      Config override for the mining back-end
";

/// Command-line interface definition for phrasemine.
#[derive(Parser, Debug)]
#[command(name = "phrasemine")]
#[command(about = "Mine frequent contiguous phrases from a document corpus", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// Input corpus: a directory scanned recursively, or a CSV-like file
    /// with one document per row
    pub input: Utf8PathBuf,

    /// Minimum document frequency for a phrase
    #[arg(long = "n", value_name = "INT")]
    pub min_docs: Option<u32>,

    /// Minimum phrase length; also the seed length for the greedy engine
    #[arg(long = "ngrams", value_name = "INT")]
    pub min_len: Option<usize>,

    /// Mining back-end
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Output filter for the prefixspan engine
    #[arg(long, value_enum)]
    pub mode: Option<MiningMode>,

    /// Fraction of inputs retained after shuffling, in [0, 1]
    #[arg(long, value_name = "FLOAT")]
    pub sampling: Option<f64>,

    /// Filename filter for directory scans: empty or `*` matches all,
    /// `*.EXT` matches by extension, anything else is an exact name
    #[arg(long, value_name = "PATTERN")]
    pub mask: Option<String>,

    /// Worker threads for tokenization (0 = all cores)
    #[arg(long, value_name = "INT")]
    pub threads: Option<usize>,

    /// Memory hint in MB (advisory only)
    #[arg(long, value_name = "INT")]
    pub mem: Option<usize>,

    /// Maximum documents retained by the on-disk cache
    #[arg(long, value_name = "INT")]
    pub cache: Option<usize>,

    /// Keep the entire corpus in memory (required by prefixspan)
    #[arg(long = "in-mem")]
    pub in_mem: bool,

    /// Warm the document cache during loading
    #[arg(long)]
    pub preload: bool,

    /// CSV field delimiter; `\t` and `\n` escapes are recognized
    #[arg(long = "csv-delim", value_name = "CHAR")]
    pub csv_delim: Option<String>,

    /// After mining, link each phrase to its longest contained sub-phrase
    /// and write the hierarchy as an enriched CSV plus an HTML tree view
    #[arg(long)]
    pub tree: bool,

    /// Maximum nodes included in the HTML tree view
    #[arg(long = "tree-limit", value_name = "INT")]
    pub tree_limit: Option<usize>,

    /// Result CSV path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// Path to configuration file (overrides discovery)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Print the run summary as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
