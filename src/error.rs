use crate::document::DocumentId;
use thiserror::Error;

/// Errors surfaced by the engine. All of them are caller-input errors
/// detected before any shared state is touched; the failed operation can be
/// retried with corrected input without leaving partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The id is negative, already present, or required to be live but isn't
    #[error("invalid document id: {0}")]
    InvalidDocumentId(DocumentId),

    /// A word contained an ASCII control character during indexing
    #[error("word {0:?} contains a control character")]
    InvalidWord(String),

    /// A query token was malformed, e.g. a bare `-` or `--word`
    #[error("query word {0:?} is malformed")]
    InvalidQueryWord(String),

    /// A stop word was malformed at construction
    #[error("stop word {0:?} contains a control character")]
    InvalidStopWord(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
