/// TF-IDF vectorizer with a bounded vocabulary.
///
/// Tokens are lowercased runs of two or more word characters; English stop
/// words are dropped. Weights use smoothed IDF, `ln((1 + n) / (1 + df)) + 1`,
/// and every vector is L2-normalized so cosine similarity reduces to a dot
/// product.
use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use thiserror::Error;

use super::stop_words;

const TOKEN_PATTERN: &str = r"\b\w\w+\b";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TfidfError {
    #[error("empty vocabulary; documents may only contain stop words")]
    EmptyVocabulary,

    #[error("vectorizer has not been fitted")]
    NotFitted,

    #[error("query is empty")]
    EmptyQuery,
}

/// Sparse, L2-normalized term vector. Entries are sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    fn from_weights(weights: BTreeMap<usize, f32>) -> Self {
        let norm_sq: f32 = weights.values().map(|w| w * w).sum();
        if norm_sq == 0.0 {
            return Self::default();
        }
        let inv = 1.0 / norm_sq.sqrt();
        Self {
            entries: weights.into_iter().map(|(i, w)| (i, w * inv)).collect(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    /// Cosine similarity with another normalized vector. Zero vectors score 0.
    #[must_use]
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_w) = self.entries[i];
            let (b_idx, b_w) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot
    }
}

pub struct TfidfVectorizer {
    max_features: usize,
    token_pattern: Regex,
    stop_words: HashSet<&'static str>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer keeping at most `max_features` terms.
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            token_pattern: Regex::new(TOKEN_PATTERN).unwrap(),
            stop_words: stop_words::ENGLISH.iter().copied().collect(),
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Term index in the fitted vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Split text into lowercased, stop-word-free tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .map(str::to_string)
            .collect()
    }

    /// Learn vocabulary and IDF from `documents`, then return their vectors.
    ///
    /// When more than `max_features` terms survive tokenization, the most
    /// frequent ones across the whole corpus are kept (ties: alphabetical).
    /// Any previously fitted state is replaced.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>, TfidfError> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| self.tokenize(d)).collect();

        // term -> (corpus frequency, document frequency)
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        for tokens in &tokenized {
            let mut seen = HashSet::new();
            for token in tokens {
                let entry = stats.entry(token.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(token.as_str()) {
                    entry.1 += 1;
                }
            }
        }

        if stats.is_empty() {
            return Err(TfidfError::EmptyVocabulary);
        }

        let mut terms: Vec<(&str, usize, usize)> =
            stats.into_iter().map(|(t, (tf, df))| (t, tf, df)).collect();
        if terms.len() > self.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            terms.truncate(self.max_features);
        }
        terms.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = documents.len() as f32;
        self.vocabulary = terms
            .iter()
            .enumerate()
            .map(|(i, (t, _, _))| ((*t).to_string(), i))
            .collect();
        self.idf = terms
            .iter()
            .map(|(_, _, df)| ((1.0 + n_docs) / (1.0 + *df as f32)).ln() + 1.0)
            .collect();

        Ok(tokenized.iter().map(|tokens| self.weigh(tokens)).collect())
    }

    /// Vectorize `text` against the fitted vocabulary. Never refits.
    pub fn transform(&self, text: &str) -> Result<SparseVector, TfidfError> {
        if !self.is_fitted() {
            return Err(TfidfError::NotFitted);
        }
        if text.trim().is_empty() {
            return Err(TfidfError::EmptyQuery);
        }
        Ok(self.weigh(&self.tokenize(text)))
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut weights: BTreeMap<usize, f32> = BTreeMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *weights.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        for (idx, w) in weights.iter_mut() {
            *w *= self.idf[*idx];
        }
        SparseVector::from_weights(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let v = TfidfVectorizer::new(500);
        let tokens = v.tokenize("How long do Refunds take? 5 days, a week.");
        assert_eq!(tokens, vec!["long", "refunds", "days", "week"]);
    }

    #[test]
    fn test_fit_builds_sorted_vocabulary() {
        let mut v = TfidfVectorizer::new(500);
        let rows = v
            .fit_transform(&docs(&["zebra apple", "apple mango"]))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(v.vocabulary_len(), 3);
        assert_eq!(v.term_index("apple"), Some(0));
        assert_eq!(v.term_index("mango"), Some(1));
        assert_eq!(v.term_index("zebra"), Some(2));
    }

    #[test]
    fn test_rows_are_normalized() {
        let mut v = TfidfVectorizer::new(500);
        let rows = v
            .fit_transform(&docs(&["refunds business days", "ship days"]))
            .unwrap();
        for row in &rows {
            let norm: f32 = row.entries().iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "got norm {norm}");
        }
    }

    #[test]
    fn test_smoothed_idf_weights_rare_terms_higher() {
        let mut v = TfidfVectorizer::new(500);
        let rows = v
            .fit_transform(&docs(&["refunds days", "ship days"]))
            .unwrap();
        let days = v.term_index("days").unwrap();
        let refunds = v.term_index("refunds").unwrap();
        let weight = |idx| rows[0].entries().iter().find(|(i, _)| *i == idx).unwrap().1;
        assert!(weight(refunds) > weight(days));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = TfidfVectorizer::new(2);
        v.fit_transform(&docs(&["apple apple banana", "apple cherry banana", "durian"]))
            .unwrap();
        assert_eq!(v.vocabulary_len(), 2);
        assert!(v.term_index("apple").is_some());
        assert!(v.term_index("banana").is_some());
        assert!(v.term_index("durian").is_none());
    }

    #[test]
    fn test_only_stop_words_is_empty_vocabulary() {
        let mut v = TfidfVectorizer::new(500);
        let err = v.fit_transform(&docs(&["the and of", "a"])).unwrap_err();
        assert_eq!(err, TfidfError::EmptyVocabulary);
        assert!(!v.is_fitted());
    }

    #[test]
    fn test_transform_requires_fit() {
        let v = TfidfVectorizer::new(500);
        assert_eq!(v.transform("refunds").unwrap_err(), TfidfError::NotFitted);
    }

    #[test]
    fn test_transform_does_not_learn_new_terms() {
        let mut v = TfidfVectorizer::new(500);
        v.fit_transform(&docs(&["refunds policy"])).unwrap();
        let q = v.transform("completely unrelated words").unwrap();
        assert!(q.is_zero());
        assert_eq!(v.vocabulary_len(), 2);
    }

    #[test]
    fn test_transform_empty_query() {
        let mut v = TfidfVectorizer::new(500);
        v.fit_transform(&docs(&["refunds policy"])).unwrap();
        assert_eq!(v.transform("   ").unwrap_err(), TfidfError::EmptyQuery);
    }

    #[test]
    fn test_cosine_identity_and_disjoint() {
        let mut v = TfidfVectorizer::new(500);
        let rows = v
            .fit_transform(&docs(&["refunds policy", "shipping times"]))
            .unwrap();
        assert!((rows[0].cosine(&rows[0]) - 1.0).abs() < 1e-5);
        assert_eq!(rows[0].cosine(&rows[1]), 0.0);
        assert_eq!(rows[0].cosine(&SparseVector::default()), 0.0);
    }
}
