//! Error types for StudyRAG

use thiserror::Error;

/// Result type alias for StudyRAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in StudyRAG operations
///
/// Structural and collaborator failures surface here; degenerate numeric
/// inputs (empty gold lists, empty hit vectors) are not errors and produce
/// defined zero-valued metrics instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Input file missing, unreadable, or structurally invalid
    #[error("invalid input: {0}")]
    Input(String),

    /// A dataset line failed to parse as an evaluation example
    #[error("malformed dataset record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Retrieval collaborator failed
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Generation collaborator failed
    #[error("generation error: {0}")]
    Generation(String),

    /// Embedding backend failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector index could not be read, written, or queried
    #[error("index error: {0}")]
    Store(String),

    /// Document reader failed or the format is unsupported
    #[error("document read error: {0}")]
    Reader(String),

    /// Embedding cache failure
    #[error("cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
