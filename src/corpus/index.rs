use tracing::{debug, warn};

use super::tfidf::{SparseVector, TfidfError, TfidfVectorizer};

/// A scored corpus row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub score: f32,
}

/// Fitted vectorizer plus one TF-IDF row per document, aligned by index.
pub struct LexicalIndex {
    documents: Vec<String>,
    vectorizer: TfidfVectorizer,
    rows: Vec<SparseVector>,
}

impl LexicalIndex {
    /// Fit a vectorizer over `documents` and vectorize them.
    pub fn build(documents: Vec<String>, max_features: usize) -> Result<Self, TfidfError> {
        let mut vectorizer = TfidfVectorizer::new(max_features);
        let rows = vectorizer.fit_transform(&documents)?;
        debug_assert_eq!(rows.len(), documents.len());
        Ok(Self {
            documents,
            vectorizer,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    /// Top `top_k` rows by descending cosine similarity.
    ///
    /// Equal scores keep corpus order, so the earlier row wins a tie.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Match>, TfidfError> {
        let query_vec = self.vectorizer.transform(query)?;
        let mut scored: Vec<Match> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| Match {
                index,
                score: query_vec.cosine(row),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Context block for `query`: the top `top_k` documents scoring strictly
    /// above `min_similarity`, best first, separated by blank lines.
    ///
    /// Any vectorization problem yields an empty string.
    pub fn retrieve(&self, query: &str, top_k: usize, min_similarity: f32) -> String {
        let matches = match self.search(query, top_k) {
            Ok(m) => m,
            Err(e) => {
                warn!("Context retrieval failed: {e}");
                return String::new();
            }
        };

        let relevant: Vec<&str> = matches
            .iter()
            .filter(|m| m.score > min_similarity)
            .map(|m| self.documents[m.index].as_str())
            .collect();

        debug!(
            "Retrieved {} of {} candidates above {min_similarity}",
            relevant.len(),
            matches.len()
        );

        relevant.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faq() -> Vec<String> {
        [
            "Refunds take 5 business days.",
            "We ship within 3 days.",
            "Contact support at help@example.com",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_index_aligned_with_corpus() {
        let index = LexicalIndex::build(faq(), 500).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.documents().len(), index.len());
    }

    #[test]
    fn test_refund_question_hits_refund_row() {
        let index = LexicalIndex::build(faq(), 500).unwrap();
        let context = index.retrieve("How long do refunds take?", 3, 0.1);
        assert!(context.starts_with("Refunds take 5 business days."));
        assert!(!context.contains("help@example.com"));
    }

    #[test]
    fn test_descending_order() {
        let docs: Vec<String> = [
            "apple banana cherry",
            "apple",
            "durian elderberry",
            "apple banana",
            "fig grape",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let index = LexicalIndex::build(docs, 500).unwrap();
        let matches = index.search("apple banana cherry", 3).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].index, 0);
        for pair in matches.windows(2) {
            assert!(pair[0].score > pair[1].score, "{pair:?}");
        }
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let docs: Vec<String> = ["refunds policy", "refunds policy", "shipping"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let index = LexicalIndex::build(docs, 500).unwrap();
        let matches = index.search("refunds", 2).unwrap();
        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[1].index, 1);
    }

    #[test]
    fn test_below_threshold_is_empty_for_any_top_k() {
        let index = LexicalIndex::build(faq(), 500).unwrap();
        for top_k in [1, 3, 10] {
            assert_eq!(index.retrieve("quantum chromodynamics", top_k, 0.1), "");
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let index = LexicalIndex::build(faq(), 500).unwrap();
        let best = index.search("refunds", 1).unwrap()[0].score;
        assert_eq!(index.retrieve("refunds", 3, best), "");
        assert!(!index.retrieve("refunds", 3, best - 0.01).is_empty());
    }

    #[test]
    fn test_empty_query_degrades_to_empty_context() {
        let index = LexicalIndex::build(faq(), 500).unwrap();
        assert_eq!(index.retrieve("", 3, 0.1), "");
    }

    #[test]
    fn test_zero_top_k() {
        let index = LexicalIndex::build(faq(), 500).unwrap();
        assert_eq!(index.retrieve("refunds", 0, 0.1), "");
    }

    #[test]
    fn test_multiple_hits_joined_by_blank_line() {
        let docs: Vec<String> = ["refunds card", "refunds cash", "shipping"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let index = LexicalIndex::build(docs, 500).unwrap();
        let context = index.retrieve("refunds", 3, 0.1);
        assert_eq!(context, "refunds card\n\nrefunds cash");
    }
}
