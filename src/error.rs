//! Error kinds surfaced by the core.

use std::path::PathBuf;

/// Errors the core can return to a caller.
///
/// `SaturationEvent` from the design is not an error and is never
/// constructed here; it is only logged via `tracing::debug!` at the call
/// site in [`crate::learning`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema error in {path:?}:{line}: {message}")]
    Schema {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("attempted to mutate a read-only dictionary")]
    ImmutableDictionary,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("binary dictionary encoding error: {0}")]
    Encoding(#[from] Box<bincode::ErrorKind>),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io { path: path.into(), source }
    }

    pub fn schema(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        CoreError::Schema { path: path.into(), line, message: message.into() }
    }
}
