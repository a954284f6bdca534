use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::scope::ScopeContext;

/// Ignore words grouped by scope.
///
/// Serialized as `{"__global__": [...], "TMP": [...], "__genre__": {name: [...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreWords {
    #[serde(rename = "__global__", default)]
    pub global: Vec<String>,
    #[serde(rename = "TMP", default)]
    pub temporary: Vec<String>,
    #[serde(rename = "__genre__", default)]
    pub genre: BTreeMap<String, Vec<String>>,
}

impl IgnoreWords {
    /// Builds the scoped store from a legacy flat list, placing it under global.
    pub fn from_legacy(words: Vec<String>) -> Self {
        let mut store = Self {
            global: words,
            ..Default::default()
        };
        store.sanitize();
        store
    }

    /// The words stored for `context`.
    pub fn words(&self, context: &ScopeContext) -> &[String] {
        match context {
            ScopeContext::Temporary => &self.temporary,
            ScopeContext::Global => &self.global,
            ScopeContext::Genre(name) => self.genre.get(name).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    fn bucket_mut(&mut self, context: &ScopeContext) -> &mut Vec<String> {
        match context {
            ScopeContext::Temporary => &mut self.temporary,
            ScopeContext::Global => &mut self.global,
            ScopeContext::Genre(name) => self.genre.entry(name.clone()).or_default(),
        }
    }

    /// Adds a single word to the bucket for `context`.
    ///
    /// The word is trimmed; blank words and words already present are skipped.
    /// Returns `true` if the word was added.
    pub fn add(&mut self, context: &ScopeContext, word: &str) -> bool {
        let trimmed = word.trim();
        if trimmed.is_empty() {
            return false;
        }
        let bucket = self.bucket_mut(context);
        if bucket.iter().any(|w| w == trimmed) {
            return false;
        }
        bucket.push(trimmed.to_string());
        true
    }

    /// Splits `text` on whitespace and adds every token. Returns how many were new.
    pub fn add_tokens(&mut self, context: &ScopeContext, text: &str) -> usize {
        text.split_whitespace()
            .filter(|token| self.add(context, token))
            .count()
    }

    /// Removes `word` from the bucket for `context`. Returns `true` if it was present.
    pub fn remove(&mut self, context: &ScopeContext, word: &str) -> bool {
        let bucket = match context {
            ScopeContext::Temporary => &mut self.temporary,
            ScopeContext::Global => &mut self.global,
            ScopeContext::Genre(name) => match self.genre.get_mut(name) {
                Some(bucket) => bucket,
                None => return false,
            },
        };
        let before = bucket.len();
        bucket.retain(|w| w != word);
        before != bucket.len()
    }

    /// Words that apply when `genre` is active: global words followed by that genre's words.
    pub fn effective_for_genre(&self, genre: &str) -> Vec<String> {
        let mut words = self.global.clone();
        if let Some(genre_words) = self.genre.get(genre) {
            for w in genre_words {
                if !words.contains(w) {
                    words.push(w.clone());
                }
            }
        }
        words
    }

    /// Drops empty and whitespace-only entries from every bucket.
    pub fn sanitize(&mut self) {
        let clean = |words: &mut Vec<String>| {
            words.retain(|w| !w.trim().is_empty());
        };
        clean(&mut self.global);
        clean(&mut self.temporary);
        for words in self.genre.values_mut() {
            clean(words);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_trims_and_deduplicates() {
        let mut store = IgnoreWords::default();
        assert!(store.add(&ScopeContext::Global, "  sample "));
        assert!(!store.add(&ScopeContext::Global, "sample"));
        assert!(!store.add(&ScopeContext::Global, "   "));
        assert_eq!(store.global, vec!["sample"]);
    }

    #[test]
    fn test_add_tokens_splits_on_whitespace() {
        let mut store = IgnoreWords::default();
        let genre = ScopeContext::Genre("Comics".to_string());
        assert_eq!(store.add_tokens(&genre, "raw  scan\tHQ raw"), 3);
        assert_eq!(store.words(&genre), ["raw", "scan", "HQ"]);
        assert!(store.words(&ScopeContext::Genre("Novels".to_string())).is_empty());
    }

    #[test]
    fn test_legacy_list_goes_to_global_without_blanks() {
        let store = IgnoreWords::from_legacy(vec!["a".into(), " ".into(), "b".into()]);
        assert_eq!(store.global, vec!["a", "b"]);
        assert!(store.temporary.is_empty());
        assert!(store.genre.is_empty());
    }

    #[test]
    fn test_effective_words_for_genre() {
        let mut store = IgnoreWords::default();
        store.add(&ScopeContext::Global, "sample");
        store.add(&ScopeContext::Genre("Comics".to_string()), "raw");
        store.add(&ScopeContext::Genre("Comics".to_string()), "sample");
        assert_eq!(store.effective_for_genre("Comics"), vec!["sample", "raw"]);
        assert_eq!(store.effective_for_genre("Novels"), vec!["sample"]);
    }

    #[test]
    fn test_remove_word() {
        let mut store = IgnoreWords::default();
        store.add(&ScopeContext::Temporary, "x");
        assert!(store.remove(&ScopeContext::Temporary, "x"));
        assert!(!store.remove(&ScopeContext::Temporary, "x"));
    }

    #[test]
    fn test_remove_from_unknown_genre_creates_no_bucket() {
        let mut store = IgnoreWords::default();
        assert!(!store.remove(&ScopeContext::Genre("Music".to_string()), "flac"));
        assert!(store.genre.is_empty());
    }
}
