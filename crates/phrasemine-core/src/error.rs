//! Error types for phrasemine-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading a corpus or writing results.
///
/// Per-file read failures during a batch scan are not errors: a document
/// that cannot be read contributes an empty token sequence and is skipped
/// by mining. Only failures of the input root itself surface here.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The input root does not exist or cannot be scanned.
    #[error("cannot read input {path}: {source}")]
    InputUnreadable {
        /// The path given on the command line.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The sampling fraction is outside `[0, 1]`.
    #[error("sampling fraction {0} is outside [0, 1]")]
    BadSampling(f64),

    /// The on-disk corpus cache failed to read or write.
    #[error("corpus cache I/O failed: {0}")]
    Cache(#[from] std::io::Error),
}

/// Result type alias using [`LoadError`].
pub type LoadResult<T> = Result<T, LoadError>;
