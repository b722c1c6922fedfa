use crate::error::{Result, SearchError};
use std::collections::HashSet;

/// Split text on runs of spaces, discarding empty tokens. Any token that
/// contains an ASCII control character fails the whole call.
pub fn split_words(text: &str) -> Result<Vec<&str>> {
    let mut words = Vec::new();
    for word in text.split(' ') {
        if word.is_empty() {
            continue;
        }
        if !is_valid_word(word) {
            return Err(SearchError::InvalidWord(word.to_string()));
        }
        words.push(word);
    }
    Ok(words)
}

/// A valid word has no code points below 0x20
fn is_valid_word(word: &str) -> bool {
    word.chars().all(|c| c as u32 >= 0x20)
}

/// Case-sensitive stop-word filter, immutable after construction
#[derive(Debug, Default)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// Build from any collection of words. Empty entries are dropped; a
    /// control character in any entry is an `InvalidStopWord`.
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = HashSet::new();
        for word in stop_words {
            let word = word.into();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(&word) {
                return Err(SearchError::InvalidStopWord(word));
            }
            set.insert(word);
        }
        Ok(Self { stop_words: set })
    }

    /// Build from a single space-separated string
    pub fn from_text(text: &str) -> Result<Self> {
        let words = split_words(text).map_err(|err| match err {
            SearchError::InvalidWord(word) => SearchError::InvalidStopWord(word),
            other => other,
        })?;
        Self::new(words)
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Tokenize for indexing: split, validate, drop stop words
    pub fn split_words_no_stop<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        Ok(split_words(text)?
            .into_iter()
            .filter(|word| !self.is_stop_word(word))
            .collect())
    }
}
