//! Dictionary
//!
//! Immutable word lists loaded once at startup: the answer list every
//! target is drawn from, the valid-guess superset, and the curated common
//! subset the easier synthetic opponents favor. Freely shared behind `Arc`
//! after init.

mod pattern;

use std::collections::HashSet;
use std::path::Path;

use rand::Rng;
use thiserror::Error;

use crate::WORD_LENGTH;

pub use pattern::{evaluate, Color, Pattern};

/// Errors raised while loading the word lists.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// A list file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending file path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A list file is not a JSON array of strings.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Offending file path.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A word has the wrong length or non-ASCII-alphabetic characters.
    #[error("malformed word {word:?} in {list}")]
    MalformedWord {
        /// The word as found in the list.
        word: String,
        /// Which list it came from.
        list: &'static str,
    },

    /// The answer list (or common list) is not a subset of the valid set.
    #[error("{word:?} from {list} is missing from the valid-guess set")]
    NotASubset {
        /// The uncovered word.
        word: String,
        /// Which list it came from.
        list: &'static str,
    },

    /// The answer list is empty.
    #[error("answer list is empty")]
    Empty,
}

/// The immutable word lists.
///
/// All words are held uppercase. `answers` is the pool targets are drawn
/// from; `valid` is the superset every guess is checked against; `common`
/// is the curated subset used by easy/medium bots.
#[derive(Debug)]
pub struct Dictionary {
    answers: Vec<String>,
    valid: Vec<String>,
    valid_set: HashSet<String>,
    common: Vec<String>,
    common_set: HashSet<String>,
}

impl Dictionary {
    /// Load `answers.json`, `valid_guesses.json` and `common_words.json`
    /// from a directory. Lists are JSON arrays of lowercase 5-letter
    /// strings; they are uppercased in memory.
    pub fn load(dir: &Path) -> Result<Self, DictionaryError> {
        let answers = load_list(&dir.join("answers.json"))?;
        let valid = load_list(&dir.join("valid_guesses.json"))?;
        let common = load_list(&dir.join("common_words.json"))?;
        Self::from_lists(answers, valid, common)
    }

    /// Build from in-memory lists (case-insensitive). Used by tests and by
    /// `load` after file parsing.
    pub fn from_lists(
        answers: Vec<String>,
        valid: Vec<String>,
        common: Vec<String>,
    ) -> Result<Self, DictionaryError> {
        let answers = normalize_list(answers, "answers")?;
        let mut valid = normalize_list(valid, "valid_guesses")?;
        let common = normalize_list(common, "common_words")?;

        let mut valid_set: HashSet<String> = valid.iter().cloned().collect();
        // The superset always covers the answers.
        for word in &answers {
            if valid_set.insert(word.clone()) {
                valid.push(word.clone());
            }
        }
        for word in &common {
            if !valid_set.contains(word) {
                return Err(DictionaryError::NotASubset {
                    word: word.clone(),
                    list: "common_words",
                });
            }
        }
        if answers.is_empty() {
            return Err(DictionaryError::Empty);
        }

        let common_set = common.iter().cloned().collect();
        Ok(Self {
            answers,
            valid,
            valid_set,
            common,
            common_set,
        })
    }

    /// Pick a target word uniformly from the answer list.
    pub fn random_answer<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // Construction guarantees a non-empty answer list.
        &self.answers[rng.gen_range(0..self.answers.len())]
    }

    /// Case-insensitive membership test against the valid-guess superset.
    pub fn is_valid_guess(&self, word: &str) -> bool {
        if word.chars().count() != WORD_LENGTH {
            return false;
        }
        self.valid_set.contains(&word.to_ascii_uppercase())
    }

    /// Whether an (uppercase) word is in the curated common subset.
    pub fn is_common(&self, word: &str) -> bool {
        self.common_set.contains(word)
    }

    /// The full answer list, uppercase.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// The full valid-guess list, uppercase.
    pub fn valid_guesses(&self) -> &[String] {
        &self.valid
    }

    /// The curated common subset, uppercase.
    pub fn common_words(&self) -> &[String] {
        &self.common
    }
}

fn load_list(path: &Path) -> Result<Vec<String>, DictionaryError> {
    let text = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DictionaryError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn normalize_list(
    words: Vec<String>,
    list: &'static str,
) -> Result<Vec<String>, DictionaryError> {
    let mut out = Vec::with_capacity(words.len());
    let mut seen = HashSet::with_capacity(words.len());
    for word in words {
        if word.chars().count() != WORD_LENGTH || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DictionaryError::MalformedWord { word, list });
        }
        let upper = word.to_ascii_uppercase();
        if seen.insert(upper.clone()) {
            out.push(upper);
        }
    }
    Ok(out)
}
