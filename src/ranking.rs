use crate::concurrent_map::ConcurrentMap;
use crate::document::{Document, DocumentId, DocumentRecord, DocumentStatus};
use crate::index::TermIndex;
use crate::query::Query;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Upper bound on documents returned per query
pub const MAX_RESULTS: usize = 5;

/// Relevance gaps below this are ties, broken by rating
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// Shard count for the parallel relevance accumulator. Document ids are the
/// contention point under high fan-out; striping turns one hot lock into
/// many cooler ones.
const ACCUMULATOR_SHARDS: usize = 64;

/// Relevance descending, rating descending within epsilon
pub(crate) fn compare_ranked(lhs: &Document, rhs: &Document) -> Ordering {
    if (lhs.relevance - rhs.relevance).abs() < RELEVANCE_EPSILON {
        rhs.rating.cmp(&lhs.rating)
    } else {
        rhs.relevance
            .partial_cmp(&lhs.relevance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Natural log of (live documents / documents containing the word). Only
/// called for words present in the index.
fn inverse_document_frequency(index: &TermIndex, live_documents: usize, word: &str) -> f64 {
    (live_documents as f64 / index.document_frequency(word) as f64).ln()
}

/// Sequential accumulation: TF×IDF per plus-word posting through the
/// predicate, then the minus purge. A document reachable via any minus-word
/// never survives, whatever it accumulated.
pub(crate) fn find_all<P>(
    index: &TermIndex,
    documents: &HashMap<DocumentId, DocumentRecord>,
    query: &Query,
    predicate: P,
) -> Vec<Document>
where
    P: Fn(DocumentId, DocumentStatus, i32) -> bool,
{
    let mut relevance: HashMap<DocumentId, f64> = HashMap::new();
    for word in &query.plus_words {
        let Some(postings) = index.postings(word) else {
            continue;
        };
        let idf = inverse_document_frequency(index, documents.len(), word);
        for (&id, &term_frequency) in postings {
            let record = &documents[&id];
            if predicate(id, record.status, record.rating) {
                *relevance.entry(id).or_default() += term_frequency * idf;
            }
        }
    }

    for word in &query.minus_words {
        let Some(postings) = index.postings(word) else {
            continue;
        };
        for id in postings.keys() {
            relevance.remove(id);
        }
    }

    relevance
        .into_iter()
        .map(|(id, relevance)| Document::new(id, relevance, documents[&id].rating))
        .collect()
}

/// Parallel form: rayon fan-out over plus-words and their postings,
/// accumulating through the sharded map. The minus purge and the result
/// build each start only after the previous phase has fully joined.
pub(crate) fn find_all_parallel<P>(
    index: &TermIndex,
    documents: &HashMap<DocumentId, DocumentRecord>,
    query: &Query,
    predicate: P,
) -> Vec<Document>
where
    P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
{
    let relevance: ConcurrentMap<DocumentId, f64> = ConcurrentMap::new(ACCUMULATOR_SHARDS);

    query.plus_words.par_iter().for_each(|word| {
        let Some(postings) = index.postings(word) else {
            return;
        };
        let idf = inverse_document_frequency(index, documents.len(), word);
        postings.par_iter().for_each(|(&id, &term_frequency)| {
            let record = &documents[&id];
            if predicate(id, record.status, record.rating) {
                *relevance.access(id) += term_frequency * idf;
            }
        });
    });

    query.minus_words.par_iter().for_each(|word| {
        let Some(postings) = index.postings(word) else {
            return;
        };
        for id in postings.keys() {
            relevance.erase(id);
        }
    });

    relevance
        .into_map()
        .into_par_iter()
        .map(|(id, relevance)| Document::new(id, relevance, documents[&id].rating))
        .collect()
}

/// Sort by the ranking order and keep the best `MAX_RESULTS`
pub(crate) fn top_documents(mut matched: Vec<Document>) -> Vec<Document> {
    matched.sort_by(compare_ranked);
    matched.truncate(MAX_RESULTS);
    matched
}

pub(crate) fn top_documents_parallel(mut matched: Vec<Document>) -> Vec<Document> {
    matched.par_sort_unstable_by(compare_ranked);
    matched.truncate(MAX_RESULTS);
    matched
}
