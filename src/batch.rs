use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::Result;
use rayon::prelude::*;

/// Run every query against the engine in parallel, preserving input order.
/// Each query still ranks sequentially; the fan-out is across queries.
pub fn process_queries(engine: &SearchEngine, queries: &[String]) -> Result<Vec<Vec<Document>>> {
    queries
        .par_iter()
        .map(|raw_query| engine.find_top_documents(raw_query))
        .collect()
}

/// Same fan-out, flattened into one list in query order
pub fn process_queries_joined(engine: &SearchEngine, queries: &[String]) -> Result<Vec<Document>> {
    Ok(process_queries(engine, queries)?
        .into_iter()
        .flatten()
        .collect())
}
