/*!
 * Wrong-word to correct-word substitution list.
 *
 * The list is built from two plain-text files holding one entry per line.
 * Entries are paired by position after blank lines are dropped.
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::errors::ConfigError;

/// Mapping from a misspelled word to its replacement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordSubstitutionList {
    // @field: Normalized wrong word -> correct word
    map: HashMap<String, String>,

    // @field: Wrong words in file order, for stable reporting
    order: Vec<String>,
}

impl WordSubstitutionList {
    /// Load and pair the two word-list files
    pub fn from_files<P1: AsRef<Path>, P2: AsRef<Path>>(
        wrong_words_file: P1,
        correct_words_file: P2,
    ) -> Result<Self, ConfigError> {
        let wrong = read_word_file(wrong_words_file.as_ref())?;
        let correct = read_word_file(correct_words_file.as_ref())?;
        Self::from_pairs(wrong, correct)
    }

    /// Pair two ordered lists by position
    ///
    /// Wrong words are lowercased and trimmed. Returns
    /// `ConfigError::WordListLengthMismatch` when the lists differ in length,
    /// `ConfigError::InvalidOption` when a wrong word holds whitespace, and
    /// `ConfigError::ChainedSubstitution` when a replacement contains a word
    /// that is itself scheduled for replacement.
    pub fn from_pairs(wrong: Vec<String>, correct: Vec<String>) -> Result<Self, ConfigError> {
        if wrong.len() != correct.len() {
            return Err(ConfigError::WordListLengthMismatch {
                wrong: wrong.len(),
                correct: correct.len(),
            });
        }

        let mut list = Self::default();
        for (wrong_word, correct_word) in wrong.into_iter().zip(correct) {
            let key = wrong_word.trim().to_lowercase();
            let value = correct_word.trim().to_string();
            if key.is_empty() {
                continue;
            }
            if key.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidOption(format!(
                    "wrong word '{}' contains whitespace and can never match a single token",
                    key
                )));
            }
            if key == value.to_lowercase() {
                debug!("Ignoring identity substitution '{}'", key);
                continue;
            }
            match list.map.insert(key.clone(), value) {
                Some(previous) => {
                    warn!("Wrong word '{}' listed twice, replacing '{}' with the later entry", key, previous);
                }
                None => list.order.push(key),
            }
        }

        list.check_chains()?;
        Ok(list)
    }

    /// Reject replacements that would be replaced again on a second pass
    fn check_chains(&self) -> Result<(), ConfigError> {
        for wrong in &self.order {
            let correct = &self.map[wrong];
            let chained = correct
                .split_whitespace()
                .map(str::to_lowercase)
                .any(|token| self.map.contains_key(&token));
            if chained {
                return Err(ConfigError::ChainedSubstitution {
                    wrong: wrong.clone(),
                    correct: correct.clone(),
                });
            }
        }
        Ok(())
    }

    /// Rewrite every replacement with the given normalization
    ///
    /// The pipeline uses this to push replacements through the stages that
    /// run before substitution, so that a second pass leaves them unchanged.
    pub fn normalize_replacements<F>(&mut self, normalize: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> String,
    {
        for value in self.map.values_mut() {
            *value = normalize(value);
        }
        self.check_chains()
    }

    /// Number of substitution pairs
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the list holds no pairs
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Replacement for a single token, if any
    pub fn get(&self, token: &str) -> Option<&str> {
        self.map.get(token).map(String::as_str)
    }

    /// Iterate over pairs in file order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .map(|wrong| (wrong.as_str(), self.map[wrong].as_str()))
    }

    /// Replace whole tokens and join them back with single spaces
    pub fn apply(&self, text: &str) -> String {
        self.apply_counting(text, |_| {})
    }

    /// Same as `apply`, calling `on_hit` with each replaced wrong word
    pub fn apply_counting<F>(&self, text: &str, mut on_hit: F) -> String
    where
        F: FnMut(&str),
    {
        let mut result = String::with_capacity(text.len());
        for token in text.split_whitespace() {
            if !result.is_empty() {
                result.push(' ');
            }
            match self.map.get_key_value(token) {
                Some((wrong, correct)) => {
                    on_hit(wrong);
                    result.push_str(correct);
                }
                None => result.push_str(token),
            }
        }
        result
    }
}

/// Read a word file, one trimmed entry per non-blank line
fn read_word_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::WordListUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
