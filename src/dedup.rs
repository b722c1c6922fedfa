use crate::document::DocumentId;
use crate::engine::SearchEngine;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Remove every document whose word set duplicates an earlier (lower-id)
/// document's. Term frequencies are ignored, only word identity matters.
/// Returns the removed ids in ascending order.
pub fn remove_duplicates(engine: &SearchEngine) -> Vec<DocumentId> {
    let mut seen: HashSet<BTreeSet<String>> = HashSet::new();
    let mut duplicates = Vec::new();

    for id in engine.document_ids() {
        let words: BTreeSet<String> = engine.word_frequencies(id).into_keys().collect();
        if !seen.insert(words) {
            duplicates.push(id);
        }
    }

    for &id in &duplicates {
        debug!(id, "removing duplicate document");
        engine.remove_document(id);
    }

    duplicates
}
