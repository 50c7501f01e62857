use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while creating or opening a merge source.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("unknown merge backend '{0}'")]
    UnknownBackend(String),
    #[error("merge backend '{0}' is already registered")]
    DuplicateBackend(String),
    #[error("merge source has no locator configured")]
    MissingSource,
    #[error("failed to read merge source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read merge data from standard input: {0}")]
    Stdin(#[source] io::Error),
    #[error("merge source {path} is not valid text in any supported encoding")]
    InvalidEncoding { path: PathBuf },
}
