use crate::error::{Result, SearchError};
use crate::tokenizer::{split_words, Tokenizer};
use rayon::prelude::*;

/// A parsed query: plus-words must match for a relevance contribution,
/// minus-words exclude a document outright. Both lists are sorted and
/// deduplicated once parsing is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub plus_words: Vec<String>,
    pub minus_words: Vec<String>,
}

impl Query {
    /// Parse and normalize in one pass (the sequential form)
    pub fn parse(tokenizer: &Tokenizer, text: &str) -> Result<Self> {
        let mut query = Self::parse_raw(tokenizer, text)?;
        query.plus_words.sort_unstable();
        query.plus_words.dedup();
        query.minus_words.sort_unstable();
        query.minus_words.dedup();
        Ok(query)
    }

    /// Parse into pre-reserved buffers without normalizing. The parallel
    /// path calls `normalize_parallel` afterwards.
    pub fn parse_raw(tokenizer: &Tokenizer, text: &str) -> Result<Self> {
        let words = split_words(text)?;
        let mut query = Query {
            plus_words: Vec::with_capacity(words.len()),
            minus_words: Vec::with_capacity(words.len()),
        };
        for token in words {
            match parse_query_word(tokenizer, token)? {
                Some(QueryWord::Minus(word)) => query.minus_words.push(word),
                Some(QueryWord::Plus(word)) => query.plus_words.push(word),
                None => {}
            }
        }
        Ok(query)
    }

    /// Sort and deduplicate both word lists with rayon
    pub fn normalize_parallel(&mut self) {
        self.plus_words.par_sort_unstable();
        self.plus_words.dedup();
        self.minus_words.par_sort_unstable();
        self.minus_words.dedup();
    }
}

enum QueryWord {
    Plus(String),
    Minus(String),
}

/// Classify one raw token. Stop words collapse to `None`, whether or not
/// they carry a minus prefix.
fn parse_query_word(tokenizer: &Tokenizer, token: &str) -> Result<Option<QueryWord>> {
    let (word, is_minus) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if word.is_empty() || word.starts_with('-') {
        return Err(SearchError::InvalidQueryWord(token.to_string()));
    }
    if tokenizer.is_stop_word(word) {
        return Ok(None);
    }
    Ok(Some(if is_minus {
        QueryWord::Minus(word.to_string())
    } else {
        QueryWord::Plus(word.to_string())
    }))
}
