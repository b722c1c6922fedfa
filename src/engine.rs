use crate::document::{average_rating, Document, DocumentId, DocumentRecord, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::index::TermIndex;
use crate::query::Query;
use crate::ranking;
use crate::tokenizer::Tokenizer;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// How an operation executes. Callers pick the mode explicitly; both modes
/// produce the same result set up to the relevance epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

/// Shared mutable state: the dual index, per-document records, and the
/// live-id set. Mutated only by add/remove, read by any number of queries.
#[derive(Debug, Default)]
struct EngineState {
    index: TermIndex,
    documents: HashMap<DocumentId, DocumentRecord>,
    document_ids: BTreeSet<DocumentId>,
}

/// In-memory full-text search engine: owns the documents, ranks them against
/// queries by TF-IDF, and supports incremental removal. Queries take the
/// read side of an internal reader-writer lock, so any number can run
/// concurrently; mutations are exclusive.
pub struct SearchEngine {
    tokenizer: Tokenizer,
    state: RwLock<EngineState>,
}

impl SearchEngine {
    /// Create an engine from a collection of stop words
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            tokenizer: Tokenizer::new(stop_words)?,
            state: RwLock::default(),
        })
    }

    /// Create an engine from a space-separated stop-word string
    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::from_text(text)?,
            state: RwLock::default(),
        })
    }

    /// Index a document. Fails on a negative or duplicate id and on any
    /// invalid word in the text; a failed call leaves the store untouched.
    pub fn add_document(
        &self,
        id: DocumentId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        let mut state = self.state.write();
        if id < 0 || state.documents.contains_key(&id) {
            return Err(SearchError::InvalidDocumentId(id));
        }

        // Tokenize before touching either index map so a rejected add
        // leaves no partial writes behind.
        let words = self.tokenizer.split_words_no_stop(text)?;
        let total = words.len() as f64;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for &word in &words {
            *counts.entry(word).or_default() += 1;
        }
        let frequencies: HashMap<String, f64> = counts
            .into_iter()
            .map(|(word, count)| (word.to_string(), count as f64 / total))
            .collect();

        state.index.insert_document(id, frequencies);
        state.documents.insert(
            id,
            DocumentRecord {
                rating: average_rating(ratings),
                status,
                text: text.to_string(),
            },
        );
        state.document_ids.insert(id);
        debug!(id, words = words.len(), "document added");
        Ok(())
    }

    /// Remove a document from both indices and the live-id set; no-op if
    /// the id is not live.
    pub fn remove_document(&self, id: DocumentId) {
        self.remove_document_with(ExecutionMode::Sequential, id);
    }

    pub fn remove_document_with(&self, mode: ExecutionMode, id: DocumentId) {
        let mut state = self.state.write();
        if !state.document_ids.remove(&id) {
            return;
        }
        state.documents.remove(&id);
        match mode {
            ExecutionMode::Sequential => state.index.remove_document(id),
            ExecutionMode::Parallel => state.index.remove_document_parallel(id),
        }
        debug!(id, "document removed");
    }

    /// Count of live documents
    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Snapshot of the live ids in ascending order
    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.state.read().document_ids.iter().copied().collect()
    }

    /// Word -> term-frequency mapping of one document; empty if the id is
    /// not live (absence is not an error).
    pub fn word_frequencies(&self, id: DocumentId) -> HashMap<String, f64> {
        self.state
            .read()
            .index
            .word_frequencies(id)
            .cloned()
            .unwrap_or_default()
    }

    /// The stored text of a live document
    pub fn document_text(&self, id: DocumentId) -> Option<String> {
        self.state
            .read()
            .documents
            .get(&id)
            .map(|record| record.text.clone())
    }

    /// Top documents for the query among those with Active status
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with(ExecutionMode::Sequential, raw_query)
    }

    pub fn find_top_documents_with(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by_status_with(mode, raw_query, DocumentStatus::Active)
    }

    /// Top documents among those with exactly the given status
    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by_status_with(ExecutionMode::Sequential, raw_query, status)
    }

    pub fn find_top_documents_by_status_with(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_filtered_with(mode, raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Top documents through a caller-supplied predicate; this is the
    /// filtering primitive the status and default forms wrap.
    pub fn find_top_documents_filtered<P>(
        &self,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_filtered_with(ExecutionMode::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_filtered_with<P>(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let state = self.state.read();
        match mode {
            ExecutionMode::Sequential => {
                let query = Query::parse(&self.tokenizer, raw_query)?;
                let matched = ranking::find_all(&state.index, &state.documents, &query, predicate);
                Ok(ranking::top_documents(matched))
            }
            ExecutionMode::Parallel => {
                let mut query = Query::parse_raw(&self.tokenizer, raw_query)?;
                query.normalize_parallel();
                let matched =
                    ranking::find_all_parallel(&state.index, &state.documents, &query, predicate);
                Ok(ranking::top_documents_parallel(matched))
            }
        }
    }

    /// Explain a single document against a query: every plus-word it
    /// contains, or an empty list if any minus-word hits it. Fails for an
    /// id that is not live.
    pub fn match_document(
        &self,
        raw_query: &str,
        id: DocumentId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        self.match_document_with(ExecutionMode::Sequential, raw_query, id)
    }

    pub fn match_document_with(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
        id: DocumentId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        let state = self.state.read();
        let Some(record) = state.documents.get(&id) else {
            return Err(SearchError::InvalidDocumentId(id));
        };
        match mode {
            ExecutionMode::Sequential => {
                let query = Query::parse(&self.tokenizer, raw_query)?;
                if query
                    .minus_words
                    .iter()
                    .any(|word| state.index.contains(word, id))
                {
                    return Ok((Vec::new(), record.status));
                }
                let matched = query
                    .plus_words
                    .iter()
                    .filter(|word| state.index.contains(word, id))
                    .cloned()
                    .collect();
                Ok((matched, record.status))
            }
            ExecutionMode::Parallel => {
                let mut query = Query::parse_raw(&self.tokenizer, raw_query)?;
                query.normalize_parallel();
                if query
                    .minus_words
                    .par_iter()
                    .any(|word| state.index.contains(word, id))
                {
                    return Ok((Vec::new(), record.status));
                }
                let mut matched: Vec<String> = query
                    .plus_words
                    .into_par_iter()
                    .filter(|word| state.index.contains(word, id))
                    .collect();
                matched.par_sort_unstable();
                Ok((matched, record.status))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{MAX_RESULTS, RELEVANCE_EPSILON};

    fn engine_with_stop_words() -> SearchEngine {
        SearchEngine::from_stop_words_text("и в на").unwrap()
    }

    /// The three-document corpus used throughout the ranking tests
    fn sample_engine() -> SearchEngine {
        let engine = engine_with_stop_words();
        engine
            .add_document(0, "белый кот и модный ошейник", DocumentStatus::Active, &[8, -3])
            .unwrap();
        engine
            .add_document(1, "пушистый кот пушистый хвост", DocumentStatus::Active, &[7, 2, 7])
            .unwrap();
        engine
            .add_document(
                2,
                "ухоженный пёс выразительные глаза",
                DocumentStatus::Active,
                &[5, -12, 2, 1],
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_stop_words_excluded_from_documents() {
        let engine = SearchEngine::new(Vec::<String>::new()).unwrap();
        engine
            .add_document(42, "cat in the city", DocumentStatus::Active, &[1, 2, 3])
            .unwrap();
        assert_eq!(engine.find_top_documents("in").unwrap().len(), 1);

        let filtered = SearchEngine::from_stop_words_text("in the").unwrap();
        filtered
            .add_document(42, "cat in the city", DocumentStatus::Active, &[1, 2, 3])
            .unwrap();
        assert!(filtered.find_top_documents("in").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_ids_rejected_without_side_effects() {
        let engine = sample_engine();
        assert_eq!(
            engine.add_document(-1, "пёс", DocumentStatus::Active, &[]),
            Err(SearchError::InvalidDocumentId(-1))
        );
        assert_eq!(
            engine.add_document(1, "пёс", DocumentStatus::Active, &[]),
            Err(SearchError::InvalidDocumentId(1))
        );
        assert_eq!(engine.document_count(), 3);
    }

    #[test]
    fn test_invalid_word_rejected_without_side_effects() {
        let engine = engine_with_stop_words();
        assert_eq!(
            engine.add_document(0, "broken \x01word", DocumentStatus::Active, &[]),
            Err(SearchError::InvalidWord("\x01word".to_string()))
        );
        assert_eq!(engine.document_count(), 0);
        assert!(engine.word_frequencies(0).is_empty());
        // the same id can be retried with corrected input
        engine
            .add_document(0, "fixed word", DocumentStatus::Active, &[])
            .unwrap();
        assert_eq!(engine.document_count(), 1);
    }

    #[test]
    fn test_ranking_matches_closed_form() {
        let engine = sample_engine();
        let results = engine.find_top_documents("пушистый ухоженный кот").unwrap();

        let idf = |containing: f64| (3.0 / containing).ln();
        let expected = [
            (1, idf(1.0) * 0.5 + idf(2.0) * 0.25, 5),
            (2, idf(1.0) * 0.25, -1),
            (0, idf(2.0) * 0.25, 2),
        ];

        assert_eq!(results.len(), 3);
        for (result, (id, relevance, rating)) in results.iter().zip(expected) {
            assert_eq!(result.id, id);
            assert_eq!(result.rating, rating);
            assert!((result.relevance - relevance).abs() < RELEVANCE_EPSILON);
        }
    }

    #[test]
    fn test_minus_words_exclude_absolutely() {
        let engine = sample_engine();
        let results = engine.find_top_documents("пушистый кот -хвост").unwrap();
        // doc 1 contains every plus-word but also the minus-word
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 0);
    }

    #[test]
    fn test_never_more_than_max_results() {
        let engine = engine_with_stop_words();
        for id in 0..10 {
            engine
                .add_document(id, "общий запрос", DocumentStatus::Active, &[id])
                .unwrap();
        }
        let results = engine.find_top_documents("общий").unwrap();
        assert_eq!(results.len(), MAX_RESULTS);
        // equal relevance everywhere, so ratings decide
        let ratings: Vec<i32> = results.iter().map(|doc| doc.rating).collect();
        assert_eq!(ratings, vec![9, 8, 7, 6, 5]);
    }

    #[test]
    fn test_status_filter_and_custom_predicate() {
        let engine = engine_with_stop_words();
        engine
            .add_document(0, "кот", DocumentStatus::Active, &[1])
            .unwrap();
        engine
            .add_document(1, "кот", DocumentStatus::Banned, &[2])
            .unwrap();
        engine
            .add_document(2, "кот", DocumentStatus::Irrelevant, &[3])
            .unwrap();

        let active = engine.find_top_documents("кот").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 0);

        let banned = engine
            .find_top_documents_by_status("кот", DocumentStatus::Banned)
            .unwrap();
        assert_eq!(banned.len(), 1);
        assert_eq!(banned[0].id, 1);

        let even_ids = engine
            .find_top_documents_filtered("кот", |id, _, _| id % 2 == 0)
            .unwrap();
        assert_eq!(even_ids.len(), 2);
    }

    #[test]
    fn test_match_document() {
        let engine = SearchEngine::new(Vec::<String>::new()).unwrap();
        engine
            .add_document(42, "cat in the city", DocumentStatus::Active, &[1, 2, 3])
            .unwrap();

        let (words, status) = engine.match_document("cat in city", 42).unwrap();
        assert_eq!(words, vec!["cat", "city", "in"]);
        assert_eq!(status, DocumentStatus::Active);

        let (words, _) = engine.match_document("-cat in city", 42).unwrap();
        assert!(words.is_empty());

        assert_eq!(
            engine.match_document("cat", 7),
            Err(SearchError::InvalidDocumentId(7))
        );
    }

    #[test]
    fn test_match_document_parallel_agrees() {
        let engine = sample_engine();
        for raw in ["пушистый кот", "-пушистый кот", "модный -ошейник", "пёс"] {
            for id in engine.document_ids() {
                let sequential = engine.match_document(raw, id).unwrap();
                let parallel = engine
                    .match_document_with(ExecutionMode::Parallel, raw, id)
                    .unwrap();
                assert_eq!(sequential, parallel, "query {raw:?}, id {id}");
            }
        }
    }

    #[test]
    fn test_word_frequencies_sum_to_one() {
        let engine = sample_engine();
        for id in engine.document_ids() {
            let sum: f64 = engine.word_frequencies(id).values().sum();
            assert!((sum - 1.0).abs() < RELEVANCE_EPSILON, "document {id}");
        }
        // repeated words contribute k/n once
        let frequencies = engine.word_frequencies(1);
        assert_eq!(frequencies["пушистый"], 0.5);
        assert_eq!(frequencies["кот"], 0.25);
    }

    #[test]
    fn test_word_frequencies_absent_id_is_empty() {
        let engine = sample_engine();
        assert!(engine.word_frequencies(99).is_empty());
    }

    #[test]
    fn test_remove_document_both_modes() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let engine = sample_engine();
            engine.remove_document_with(mode, 1);

            assert_eq!(engine.document_count(), 2);
            assert!(engine.word_frequencies(1).is_empty());
            assert_eq!(engine.document_ids(), vec![0, 2]);
            let results = engine.find_top_documents("пушистый кот").unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].id, 0);

            // removing again is a no-op
            engine.remove_document_with(mode, 1);
            assert_eq!(engine.document_count(), 2);
        }
    }

    #[test]
    fn test_enumeration_is_ascending_and_stable() {
        let engine = engine_with_stop_words();
        for id in [5, 1, 9, 3] {
            engine
                .add_document(id, "слово", DocumentStatus::Active, &[])
                .unwrap();
        }
        assert_eq!(engine.document_ids(), vec![1, 3, 5, 9]);
        assert_eq!(engine.document_ids(), vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_empty_query_and_unknown_words() {
        let engine = sample_engine();
        assert!(engine.find_top_documents("").unwrap().is_empty());
        assert!(engine.find_top_documents("динозавр").unwrap().is_empty());
        // a query of only minus-words has no plus contributions
        assert!(engine.find_top_documents("-кот").unwrap().is_empty());
    }

    #[test]
    fn test_all_stop_word_document_is_live_but_unmatchable() {
        let engine = engine_with_stop_words();
        engine
            .add_document(0, "и в на", DocumentStatus::Active, &[4])
            .unwrap();
        assert_eq!(engine.document_count(), 1);
        assert!(engine.word_frequencies(0).is_empty());
        assert_eq!(engine.document_ids(), vec![0]);
    }

    #[test]
    fn test_parallel_find_matches_sequential() {
        let engine = sample_engine();
        for raw in [
            "пушистый ухоженный кот",
            "кот -ошейник",
            "белый модный -хвост",
            "пёс глаза",
        ] {
            let sequential = engine.find_top_documents(raw).unwrap();
            let parallel = engine
                .find_top_documents_with(ExecutionMode::Parallel, raw)
                .unwrap();
            assert_eq!(sequential.len(), parallel.len(), "query {raw:?}");
            for (lhs, rhs) in sequential.iter().zip(&parallel) {
                assert_eq!(lhs.id, rhs.id, "query {raw:?}");
                assert!((lhs.relevance - rhs.relevance).abs() < RELEVANCE_EPSILON);
            }
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        const WORDS: [&str; 6] = ["cat", "dog", "bird", "fish", "mouse", "fox"];

        fn document_strategy() -> impl Strategy<Value = Vec<usize>> {
            prop::collection::vec(0..WORDS.len(), 1..8)
        }

        proptest! {
            #[test]
            fn parallel_equals_sequential(
                docs in prop::collection::vec(document_strategy(), 1..12),
                plus in prop::collection::vec(0..WORDS.len(), 1..4),
                minus in prop::collection::vec(0..WORDS.len(), 0..2),
            ) {
                let engine = SearchEngine::new(Vec::<String>::new()).unwrap();
                // distinct ratings so every epsilon tie breaks deterministically
                for (id, word_indices) in docs.iter().enumerate() {
                    let text: Vec<&str> = word_indices.iter().map(|&i| WORDS[i]).collect();
                    let rating = [id as i32];
                    engine
                        .add_document(id as DocumentId, &text.join(" "), DocumentStatus::Active, &rating)
                        .unwrap();
                }

                let mut query_words: Vec<String> =
                    plus.iter().map(|&i| WORDS[i].to_string()).collect();
                query_words.extend(minus.iter().map(|&i| format!("-{}", WORDS[i])));
                let raw = query_words.join(" ");

                let sequential = engine.find_top_documents(&raw).unwrap();
                let parallel = engine
                    .find_top_documents_with(ExecutionMode::Parallel, &raw)
                    .unwrap();

                // same id set, same relevances within epsilon; ordering may
                // differ only inside an epsilon tie with equal ratings
                let sequential_ids: HashSet<DocumentId> =
                    sequential.iter().map(|doc| doc.id).collect();
                let parallel_ids: HashSet<DocumentId> =
                    parallel.iter().map(|doc| doc.id).collect();
                prop_assert_eq!(&sequential_ids, &parallel_ids);
                for doc in &sequential {
                    let twin = parallel.iter().find(|p| p.id == doc.id).unwrap();
                    prop_assert!((doc.relevance - twin.relevance).abs() < RELEVANCE_EPSILON);
                }
            }

            #[test]
            fn term_frequencies_sum_to_one(
                docs in prop::collection::vec(document_strategy(), 1..8),
            ) {
                let engine = SearchEngine::new(Vec::<String>::new()).unwrap();
                for (id, word_indices) in docs.iter().enumerate() {
                    let text: Vec<&str> = word_indices.iter().map(|&i| WORDS[i]).collect();
                    engine
                        .add_document(id as DocumentId, &text.join(" "), DocumentStatus::Active, &[])
                        .unwrap();
                }
                for id in engine.document_ids() {
                    let sum: f64 = engine.word_frequencies(id).values().sum();
                    prop_assert!((sum - 1.0).abs() < RELEVANCE_EPSILON);
                }
            }
        }
    }
}
