use crate::document::DocumentId;
use rayon::prelude::*;
use std::collections::HashMap;

/// The two index maps, kept in lockstep: word -> document -> term frequency
/// and document -> word -> term frequency. Both are private; every mutation
/// goes through `insert_document` / `remove_document*`, so a (word, id, tf)
/// triple present in one map is always present in the other.
#[derive(Debug, Default)]
pub struct TermIndex {
    word_to_documents: HashMap<String, HashMap<DocumentId, f64>>,
    document_to_words: HashMap<DocumentId, HashMap<String, f64>>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly tokenized document. The caller guarantees the id is
    /// not already indexed.
    pub fn insert_document(&mut self, id: DocumentId, frequencies: HashMap<String, f64>) {
        for (word, frequency) in &frequencies {
            self.word_to_documents
                .entry(word.clone())
                .or_default()
                .insert(id, *frequency);
        }
        self.document_to_words.insert(id, frequencies);
    }

    /// Remove every trace of `id` from both maps; no-op for unknown ids.
    /// Posting lists that become empty are dropped.
    pub fn remove_document(&mut self, id: DocumentId) {
        let Some(words) = self.document_to_words.remove(&id) else {
            return;
        };
        for word in words.keys() {
            let now_empty = match self.word_to_documents.get_mut(word) {
                Some(postings) => {
                    postings.remove(&id);
                    postings.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.word_to_documents.remove(word);
            }
        }
    }

    /// Parallel form of `remove_document`: the posting-list scrub fans out
    /// over rayon. Each worker mutates a distinct inner map; the outer map
    /// is never resized while workers run.
    pub fn remove_document_parallel(&mut self, id: DocumentId) {
        let Some(words) = self.document_to_words.remove(&id) else {
            return;
        };
        self.word_to_documents
            .par_iter_mut()
            .for_each(|(word, postings)| {
                if words.contains_key(word) {
                    postings.remove(&id);
                }
            });
        for word in words.keys() {
            if self
                .word_to_documents
                .get(word)
                .is_some_and(|postings| postings.is_empty())
            {
                self.word_to_documents.remove(word);
            }
        }
    }

    /// Documents containing `word`, with their term frequencies
    pub fn postings(&self, word: &str) -> Option<&HashMap<DocumentId, f64>> {
        self.word_to_documents.get(word)
    }

    /// Word frequencies of one document
    pub fn word_frequencies(&self, id: DocumentId) -> Option<&HashMap<String, f64>> {
        self.document_to_words.get(&id)
    }

    /// Whether `word` occurs in document `id`
    pub fn contains(&self, word: &str, id: DocumentId) -> bool {
        self.word_to_documents
            .get(word)
            .is_some_and(|postings| postings.contains_key(&id))
    }

    /// Number of documents containing `word` (for IDF)
    pub fn document_frequency(&self, word: &str) -> usize {
        self.word_to_documents
            .get(word)
            .map_or(0, |postings| postings.len())
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let forward_ok = self.document_to_words.iter().all(|(id, words)| {
            words.iter().all(|(word, frequency)| {
                self.word_to_documents
                    .get(word)
                    .and_then(|postings| postings.get(id))
                    == Some(frequency)
            })
        });
        let inverted_ok = self.word_to_documents.iter().all(|(word, postings)| {
            postings.iter().all(|(id, frequency)| {
                self.document_to_words
                    .get(id)
                    .and_then(|words| words.get(word))
                    == Some(frequency)
            })
        });
        forward_ok && inverted_ok
    }
}
