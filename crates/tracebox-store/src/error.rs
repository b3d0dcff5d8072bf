use std::path::PathBuf;

/// Errors from trace store operations.
///
/// A missing trace is not an error: [`TraceStore::resolve`] returns `None`.
///
/// [`TraceStore::resolve`]: crate::TraceStore::resolve
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage root cannot be used. Fatal at startup.
    #[error("storage root {path} is unusable: {reason}")]
    Configuration { path: PathBuf, reason: String },

    /// Writing blob bytes to disk failed.
    #[error("failed to write trace to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The inbound byte stream failed before it was fully read.
    #[error("upload stream failed: {source}")]
    Upload {
        #[source]
        source: std::io::Error,
    },

    /// Opening a resolved blob for streaming failed.
    #[error("failed to read trace at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every freshly drawn identifier already named a file.
    #[error("no unused identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: usize },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a string is not a valid trace identifier.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid identifier length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid identifier character {ch:?} at byte {index}")]
    InvalidCharacter { ch: char, index: usize },
}
