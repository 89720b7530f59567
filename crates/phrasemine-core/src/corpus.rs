//! Corpus model and loaders.
//!
//! A corpus is loaded once — directory scan or CSV-like file — and is
//! read-only for the duration of a mining run. Tokenization fans out across
//! worker threads; encoding then runs strictly sequentially in load order so
//! document ids and dictionary ids are deterministic.

use camino::{Utf8Path, Utf8PathBuf};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{CacheWriter, CorpusCache};
use crate::dictionary::{Dictionary, Encoder};
use crate::error::{LoadError, LoadResult};
use crate::phrase::Token;
use crate::tokenize;

/// Seed for the sampling shuffle. Fixed so that identical inputs and
/// parameters always produce the same document order.
const SAMPLING_SEED: u64 = 0x70686d69;

/// Loader knobs, one per command-line flag.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Fraction of inputs retained after shuffling, in `[0, 1]`.
    pub sampling: f64,
    /// Filename filter for directory scans: empty or `*` matches all,
    /// `*.EXT` matches by extension, anything else is an exact name.
    pub mask: String,
    /// Tokenization worker threads; 0 uses all cores.
    pub threads: usize,
    /// Keep every encoded document resident instead of spilling to disk.
    pub in_memory: bool,
    /// Spill file for the on-disk mode.
    pub cache_path: Utf8PathBuf,
    /// Maximum documents retained in the warm cache of the on-disk mode.
    pub max_cached_docs: usize,
    /// Warm the document cache while loading.
    pub preload: bool,
    /// CSV field delimiter.
    pub csv_delimiter: u8,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            sampling: 1.0,
            mask: String::new(),
            threads: 0,
            in_memory: false,
            cache_path: Utf8PathBuf::from("corpus.bin"),
            max_cached_docs: 1000,
            preload: false,
            csv_delimiter: b',',
        }
    }
}

/// An integer-encoded document collection, read-only after loading.
#[derive(Debug)]
pub struct Corpus {
    docs: Vec<Vec<Token>>,
    sources: Vec<String>,
    dictionary: Dictionary,
    doc_freq: Vec<u32>,
    cache: Option<CorpusCache>,
    resident: bool,
}

impl Corpus {
    /// Encoded documents in load order. Empty until resident.
    pub fn docs(&self) -> &[Vec<Token>] {
        &self.docs
    }

    /// Source identifier per document (file path or CSV row label).
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// The surface-form dictionary built during encoding.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Per-token document frequency. Reporting data, not a mining filter.
    pub fn doc_freq(&self) -> &[u32] {
        &self.doc_freq
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if the corpus holds no documents.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// True once every document is in memory.
    pub fn is_resident(&self) -> bool {
        self.resident
    }

    /// Materialize every document from the on-disk cache.
    ///
    /// Both engines mine resident documents; the PrefixSpan engine requires
    /// this as an explicit precondition.
    #[tracing::instrument(skip(self))]
    pub fn ensure_resident(&mut self) -> LoadResult<()> {
        if self.resident {
            return Ok(());
        }
        if let Some(cache) = self.cache.as_mut() {
            self.docs = cache.load_all()?;
        }
        self.resident = true;
        info!(docs = self.docs.len(), "corpus materialized from cache");
        Ok(())
    }
}

/// Builds a [`Corpus`] from a directory tree or a CSV-like file.
pub struct CorpusLoader {
    opts: LoaderOptions,
}

impl CorpusLoader {
    /// Create a loader with the given options.
    pub fn new(opts: LoaderOptions) -> Self {
        Self { opts }
    }

    /// Recursively scan `root` for regular files matching the mask and load
    /// each as one document.
    ///
    /// Scan results are sorted before sampling so runs are deterministic.
    /// Files that fail to read contribute empty documents.
    #[tracing::instrument(skip(self), fields(root = %root))]
    pub fn load_directory(&self, root: &Utf8Path) -> LoadResult<Corpus> {
        std::fs::metadata(root.as_std_path()).map_err(|source| LoadError::InputUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<Utf8PathBuf> = WalkDir::new(root.as_std_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
            .filter(|path| mask_matches(&self.opts.mask, path.file_name().unwrap_or("")))
            .collect();
        paths.sort();

        let total = paths.len();
        self.sample(&mut paths)?;
        info!(
            total,
            retained = paths.len(),
            sampling = self.opts.sampling,
            "directory scan complete"
        );

        let tokenized = self.tokenize_parallel(&paths, |path| {
            match std::fs::read(path.as_std_path()) {
                Ok(bytes) => tokenize::tokenize_detected(&bytes),
                Err(err) => {
                    warn!(path = %path, error = %err, "skipping unreadable file");
                    Vec::new()
                }
            }
        });

        let sources = paths.into_iter().map(Utf8PathBuf::into_string).collect();
        self.assemble(sources, tokenized)
    }

    /// Load a CSV-like file, one document per row.
    ///
    /// Fields are joined by single spaces before tokenization; quoted fields
    /// follow the doubled-quote escape convention.
    #[tracing::instrument(skip(self), fields(path = %path))]
    pub fn load_csv(&self, path: &Utf8Path) -> LoadResult<Corpus> {
        let bytes =
            std::fs::read(path.as_std_path()).map_err(|source| LoadError::InputUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let mut rows = parse_csv_rows(&bytes, self.opts.csv_delimiter);
        let total = rows.len();
        self.sample(&mut rows)?;
        info!(total, retained = rows.len(), "CSV rows parsed");

        let tokenized = self.tokenize_parallel(&rows, |row| tokenize::tokenize_bytes(row));
        let sources = (0..rows.len()).map(|i| format!("row_{i}")).collect();
        self.assemble(sources, tokenized)
    }

    /// Shuffle-then-truncate to the sampling fraction. A full sample keeps
    /// the sorted order untouched.
    fn sample<T>(&self, items: &mut Vec<T>) -> LoadResult<()> {
        let sampling = self.opts.sampling;
        if !(0.0..=1.0).contains(&sampling) {
            return Err(LoadError::BadSampling(sampling));
        }
        if sampling < 1.0 {
            let mut rng = SmallRng::seed_from_u64(SAMPLING_SEED);
            items.shuffle(&mut rng);
            items.truncate((items.len() as f64 * sampling) as usize);
        }
        Ok(())
    }

    /// Fan tokenization out across the worker pool; document order is
    /// preserved, only per-document work is reordered.
    fn tokenize_parallel<T, F>(&self, inputs: &[T], per_item: F) -> Vec<Vec<String>>
    where
        T: Sync,
        F: Fn(&T) -> Vec<String> + Sync,
    {
        let run = || -> Vec<Vec<String>> { inputs.par_iter().map(&per_item).collect() };
        if self.opts.threads == 0 {
            return run();
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.opts.threads)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(err) => {
                debug!(error = %err, "thread pool build failed, using global pool");
                run()
            }
        }
    }

    /// Sequential encoding pass: dictionary ids, DF counting, and either
    /// resident storage or the on-disk spill.
    fn assemble(&self, sources: Vec<String>, tokenized: Vec<Vec<String>>) -> LoadResult<Corpus> {
        let mut encoder = Encoder::new();
        let mut docs = Vec::new();
        let mut writer = if self.opts.in_memory {
            None
        } else {
            Some(CacheWriter::create(
                &self.opts.cache_path,
                self.opts.max_cached_docs,
                self.opts.preload,
            )?)
        };

        for (i, words) in tokenized.iter().enumerate() {
            let encoded = encoder.encode(i as u32, words);
            match writer.as_mut() {
                None => docs.push(encoded),
                Some(w) => w.append(&encoded)?,
            }
        }

        let (dictionary, doc_freq) = encoder.finish();
        let cache = writer.map(CacheWriter::finish).transpose()?;
        let resident = cache.is_none();
        debug!(
            docs = sources.len(),
            vocabulary = dictionary.len(),
            resident,
            "corpus encoded"
        );
        Ok(Corpus {
            docs,
            sources,
            dictionary,
            doc_freq,
            cache,
            resident,
        })
    }
}

/// Filename filter for directory scans.
fn mask_matches(mask: &str, name: &str) -> bool {
    if mask.is_empty() || mask == "*" {
        return true;
    }
    if let Some(ext) = mask.strip_prefix("*.") {
        return name.rsplit_once('.').is_some_and(|(_, e)| e == ext);
    }
    name == mask
}

/// Split CSV-like bytes into rows, joining fields with single spaces.
///
/// Quoting follows the doubled-quote convention; a `\r\n` pair counts as one
/// row terminator. Blank lines produce no row.
fn parse_csv_rows(bytes: &[u8], delimiter: u8) -> Vec<Vec<u8>> {
    let mut rows = Vec::new();
    let mut row: Vec<u8> = Vec::new();
    let mut field: Vec<u8> = Vec::new();
    let mut in_quotes = false;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if in_quotes {
            if c == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    field.push(b'"');
                    i += 1;
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == b'"' {
            in_quotes = true;
        } else if c == delimiter {
            flush_field(&mut row, &mut field);
        } else if c == b'\n' || c == b'\r' {
            if !row.is_empty() || !field.is_empty() {
                flush_field(&mut row, &mut field);
                rows.push(std::mem::take(&mut row));
            }
            if c == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                i += 1;
            }
        } else {
            field.push(c);
        }
        i += 1;
    }
    if !row.is_empty() || !field.is_empty() {
        flush_field(&mut row, &mut field);
        rows.push(row);
    }
    rows
}

fn flush_field(row: &mut Vec<u8>, field: &mut Vec<u8>) {
    if !row.is_empty() {
        row.push(b' ');
    }
    row.append(field);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn in_memory_opts() -> LoaderOptions {
        LoaderOptions {
            in_memory: true,
            ..LoaderOptions::default()
        }
    }

    #[test]
    fn directory_load_sorts_and_encodes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "second doc").unwrap();
        fs::write(dir.path().join("a.txt"), "first doc").unwrap();

        let corpus = CorpusLoader::new(in_memory_opts())
            .load_directory(&utf8(&dir))
            .unwrap();

        assert_eq!(corpus.len(), 2);
        assert!(corpus.sources()[0].ends_with("a.txt"));
        assert!(corpus.sources()[1].ends_with("b.txt"));
        // "first" seen before "second" in load order
        assert_eq!(corpus.dictionary().find("first"), Some(0));
        assert_eq!(corpus.docs()[0], vec![0, 1]);
    }

    #[test]
    fn mask_filters_by_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("keep.txt"), "kept").unwrap();
        fs::write(dir.path().join("drop.md"), "dropped").unwrap();

        let opts = LoaderOptions {
            mask: "*.txt".to_string(),
            ..in_memory_opts()
        };
        let corpus = CorpusLoader::new(opts).load_directory(&utf8(&dir)).unwrap();
        assert_eq!(corpus.len(), 1);
        assert!(corpus.sources()[0].ends_with("keep.txt"));
    }

    #[test]
    fn mask_exact_name_and_wildcard() {
        assert!(mask_matches("", "any.bin"));
        assert!(mask_matches("*", "any.bin"));
        assert!(mask_matches("*.txt", "notes.txt"));
        assert!(!mask_matches("*.txt", "notes.md"));
        assert!(mask_matches("README", "README"));
        assert!(!mask_matches("README", "README.md"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = CorpusLoader::new(in_memory_opts())
            .load_directory(Utf8Path::new("/nonexistent/phrasemine"))
            .unwrap_err();
        assert!(matches!(err, LoadError::InputUnreadable { .. }));
    }

    #[test]
    fn sampling_out_of_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let opts = LoaderOptions {
            sampling: 1.5,
            ..in_memory_opts()
        };
        let err = CorpusLoader::new(opts)
            .load_directory(&utf8(&dir))
            .unwrap_err();
        assert!(matches!(err, LoadError::BadSampling(_)));
    }

    #[test]
    fn sampling_retains_fraction() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            fs::write(dir.path().join(format!("{i}.txt")), "word").unwrap();
        }
        let opts = LoaderOptions {
            sampling: 0.5,
            ..in_memory_opts()
        };
        let corpus = CorpusLoader::new(opts).load_directory(&utf8(&dir)).unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn sampling_is_deterministic() {
        let dir = TempDir::new().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("{i}.txt")), format!("word{i}")).unwrap();
        }
        let opts = LoaderOptions {
            sampling: 0.5,
            ..in_memory_opts()
        };
        let a = CorpusLoader::new(opts.clone())
            .load_directory(&utf8(&dir))
            .unwrap();
        let b = CorpusLoader::new(opts).load_directory(&utf8(&dir)).unwrap();
        assert_eq!(a.sources(), b.sources());
    }

    #[test]
    fn empty_files_become_empty_documents() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();
        fs::write(dir.path().join("full.txt"), "one token stream").unwrap();

        let corpus = CorpusLoader::new(in_memory_opts())
            .load_directory(&utf8(&dir))
            .unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(corpus.docs()[0].is_empty());
        assert_eq!(corpus.docs()[1].len(), 3);
    }

    #[test]
    fn csv_rows_become_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.csv");
        fs::write(&path, "alpha,beta\ngamma,delta\n").unwrap();

        let corpus = CorpusLoader::new(in_memory_opts())
            .load_csv(&Utf8PathBuf::from_path_buf(path).unwrap())
            .unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.sources(), &["row_0", "row_1"]);
        assert_eq!(corpus.docs()[0].len(), 2);
    }

    #[test]
    fn csv_quoted_fields_keep_delimiters_and_escapes() {
        let rows = parse_csv_rows(b"\"a,b\",c\n\"say \"\"hi\"\"\"\n", b',');
        assert_eq!(rows[0], b"a,b c".to_vec());
        assert_eq!(rows[1], b"say \"hi\"".to_vec());
    }

    #[test]
    fn csv_crlf_counts_as_one_terminator() {
        let rows = parse_csv_rows(b"one\r\ntwo\r\n", b',');
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn csv_blank_lines_produce_no_rows() {
        let rows = parse_csv_rows(b"one\n\n\ntwo\n", b',');
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn csv_tab_delimiter() {
        let rows = parse_csv_rows(b"a\tb\nc\td\n", b'\t');
        assert_eq!(rows[0], b"a b".to_vec());
        assert_eq!(rows[1], b"c d".to_vec());
    }

    #[test]
    fn on_disk_mode_round_trips_through_cache() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha beta").unwrap();
        fs::write(dir.path().join("b.txt"), "beta gamma").unwrap();

        let opts = LoaderOptions {
            in_memory: false,
            cache_path: Utf8PathBuf::from_path_buf(dir.path().join("corpus.bin")).unwrap(),
            ..LoaderOptions::default()
        };
        let mut corpus = CorpusLoader::new(opts).load_directory(&utf8(&dir)).unwrap();
        assert!(!corpus.is_resident());
        assert!(corpus.docs().is_empty());

        corpus.ensure_resident().unwrap();
        assert!(corpus.is_resident());
        assert_eq!(corpus.docs().len(), 2);
        assert_eq!(corpus.docs()[0], vec![0, 1]);
        assert_eq!(corpus.docs()[1], vec![1, 2]);
    }

    #[test]
    fn doc_freq_counts_documents_not_occurrences() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "beta beta beta").unwrap();
        fs::write(dir.path().join("b.txt"), "beta gamma").unwrap();

        let corpus = CorpusLoader::new(in_memory_opts())
            .load_directory(&utf8(&dir))
            .unwrap();
        let beta = corpus.dictionary().find("beta").unwrap();
        let gamma = corpus.dictionary().find("gamma").unwrap();
        assert_eq!(corpus.doc_freq()[beta as usize], 2);
        assert_eq!(corpus.doc_freq()[gamma as usize], 1);
    }
}
