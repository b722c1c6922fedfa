// Re-export main components
pub mod batch;
pub mod concurrent_map;
pub mod dedup;
pub mod document;
pub mod engine;
pub mod error;
pub mod history;
pub mod index;
pub mod paginate;
pub mod query;
pub mod ranking;
pub mod tokenizer;

// Re-export commonly used types
pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ConcurrentMap;
pub use dedup::remove_duplicates;
pub use document::{Document, DocumentId, DocumentStatus};
pub use engine::{ExecutionMode, SearchEngine};
pub use history::{RequestHistory, REQUEST_WINDOW};
pub use paginate::{paginate, Paginator};
pub use query::Query;
pub use ranking::{MAX_RESULTS, RELEVANCE_EPSILON};
pub use tokenizer::Tokenizer;

// Re-export error types
pub use error::{Result, SearchError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
