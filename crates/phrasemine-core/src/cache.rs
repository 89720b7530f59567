//! On-disk binary corpus cache.
//!
//! Encoded documents are concatenated into one file as little-endian 32-bit
//! token ids; a parallel `(offset, len)` table permits random access. The
//! format is process-local scratch, not standardized across runs.
//!
//! A bounded in-memory document cache fronts the file. The cache fills up to
//! its limit and then stops admitting (no eviction), matching the loader's
//! optional preload pass.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::phrase::Token;

/// Streams encoded documents to the cache file during loading.
pub struct CacheWriter {
    path: Utf8PathBuf,
    out: BufWriter<File>,
    offsets: Vec<u64>,
    lengths: Vec<u32>,
    written: u64,
    warm: BTreeMap<u32, Vec<Token>>,
    max_cached: usize,
    preload: bool,
}

impl CacheWriter {
    /// Create or truncate the cache file at `path`.
    ///
    /// With `preload`, up to `max_cached` documents are retained in memory
    /// while writing so early reads skip the disk.
    pub fn create(path: &Utf8Path, max_cached: usize, preload: bool) -> io::Result<Self> {
        let file = File::create(path.as_std_path())?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            offsets: Vec::new(),
            lengths: Vec::new(),
            written: 0,
            warm: BTreeMap::new(),
            max_cached,
            preload,
        })
    }

    /// Append one document and record its offset and length.
    pub fn append(&mut self, doc: &[Token]) -> io::Result<()> {
        let doc_id = self.offsets.len() as u32;
        self.offsets.push(self.written);
        self.lengths.push(doc.len() as u32);
        for token in doc {
            self.out.write_all(&token.to_le_bytes())?;
        }
        self.written += doc.len() as u64 * 4;
        if self.preload && self.warm.len() < self.max_cached {
            self.warm.insert(doc_id, doc.to_vec());
        }
        Ok(())
    }

    /// Flush and reopen the file for random-access reads.
    pub fn finish(mut self) -> io::Result<CorpusCache> {
        self.out.flush()?;
        drop(self.out);
        let file = File::open(self.path.as_std_path())?;
        debug!(
            docs = self.offsets.len(),
            bytes = self.written,
            warm = self.warm.len(),
            "corpus cache written"
        );
        Ok(CorpusCache {
            file,
            offsets: self.offsets,
            lengths: self.lengths,
            warm: self.warm,
            max_cached: self.max_cached,
        })
    }
}

/// Random-access reader over a finished cache file.
#[derive(Debug)]
pub struct CorpusCache {
    file: File,
    offsets: Vec<u64>,
    lengths: Vec<u32>,
    warm: BTreeMap<u32, Vec<Token>>,
    max_cached: usize,
}

impl CorpusCache {
    /// Number of documents in the cache.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True if the cache holds no documents.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Read one document, consulting the warm cache first.
    pub fn doc(&mut self, doc_id: u32) -> io::Result<Vec<Token>> {
        if let Some(doc) = self.warm.get(&doc_id) {
            return Ok(doc.clone());
        }
        let doc = self.read_from_disk(doc_id)?;
        if self.warm.len() < self.max_cached {
            self.warm.insert(doc_id, doc.clone());
        }
        Ok(doc)
    }

    /// Materialize every document in load order, using the warm cache where
    /// it can.
    pub fn load_all(&mut self) -> io::Result<Vec<Vec<Token>>> {
        let mut docs = Vec::with_capacity(self.len());
        for doc_id in 0..self.len() as u32 {
            docs.push(self.doc(doc_id)?);
        }
        Ok(docs)
    }

    fn read_from_disk(&mut self, doc_id: u32) -> io::Result<Vec<Token>> {
        let idx = doc_id as usize;
        let len = self.lengths[idx] as usize;
        self.file.seek(SeekFrom::Start(self.offsets[idx]))?;
        let mut buf = vec![0u8; len * 4];
        self.file.read_exact(&mut buf)?;
        Ok(buf
            .chunks_exact(4)
            .map(|c| Token::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}
