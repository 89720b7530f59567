//! Core library for phrasemine.
//!
//! Mines frequent contiguous word sequences ("phrases") from a corpus of
//! natural-language documents. Documents are tokenized, integer-encoded
//! through a [`dictionary::Dictionary`], and handed to one of two
//! interchangeable engines sharing the same data model:
//!
//! - [`engine::greedy`] — seed-and-extend mining with path compression
//! - [`engine::prefixspan`] — depth-first projected-database mining with
//!   ALL / CLOSED / MAXIMAL output modes
//!
//! The flat result set can be post-processed into a parent/child phrase
//! hierarchy and a browsable HTML tree ([`tree`]).
//!
//! # Quick start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use phrasemine_core::cancel::CancelToken;
//! use phrasemine_core::corpus::{CorpusLoader, LoaderOptions};
//! use phrasemine_core::engine::{self, MiningParams};
//! use phrasemine_core::phrase::Phrase;
//!
//! let opts = LoaderOptions { in_memory: true, ..LoaderOptions::default() };
//! let corpus = CorpusLoader::new(opts)
//!     .load_directory(Utf8Path::new("data"))
//!     .expect("corpus loads");
//!
//! let params = MiningParams { min_docs: 10, min_len: 4 };
//! let mut phrases: Vec<Phrase> = Vec::new();
//! engine::greedy::mine(corpus.docs(), &params, &CancelToken::new(), &mut phrases);
//! ```
#![deny(unsafe_code)]

pub mod cache;
pub mod cancel;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod output;
pub mod phrase;
pub mod tokenize;
pub mod tree;

pub use cancel::CancelToken;
pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use corpus::{Corpus, CorpusLoader, LoaderOptions};
pub use engine::{EngineKind, MiningMode, MiningParams};
pub use error::{ConfigError, ConfigResult, LoadError, LoadResult};
pub use phrase::{Occurrence, Phrase, PhraseSink, Token};
pub use tree::{PhraseNode, PhraseRecord};
