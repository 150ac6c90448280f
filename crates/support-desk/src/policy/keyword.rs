//! Keyword Policy Index
//!
//! Ranks documents by how many query terms they share, with a boost when the
//! query names the document's topic.

use std::collections::HashSet;

use async_trait::async_trait;

use super::PolicyIndex;
use crate::error::{DeskError, Result};
use crate::model::PolicyDocument;
use crate::seed;

/// Added to a document's score when its topic appears in the query
const TOPIC_BOOST: usize = 3;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "can", "do", "does", "for", "how", "i", "if", "in", "is", "it",
    "me", "my", "of", "on", "or", "the", "to", "what", "when", "you", "your",
];

struct Entry {
    document: PolicyDocument,
    terms: HashSet<String>,
    topic: String,
}

/// In-memory term-overlap index
pub struct KeywordPolicyIndex {
    entries: Vec<Entry>,
}

impl KeywordPolicyIndex {
    pub fn new(documents: impl IntoIterator<Item = PolicyDocument>) -> Self {
        let entries = documents
            .into_iter()
            .map(|document| Entry {
                terms: terms(&document.content),
                topic: stem(&document.topic.to_lowercase()),
                document,
            })
            .collect();
        Self { entries }
    }

    /// Index over the published store policies
    pub fn seeded() -> Self {
        Self::new(seed::policies())
    }

    fn score(entry: &Entry, query: &HashSet<String>) -> usize {
        let overlap = query.intersection(&entry.terms).count();
        let boost = if query.contains(&entry.topic) { TOPIC_BOOST } else { 0 };
        overlap + boost
    }
}

#[async_trait]
impl PolicyIndex for KeywordPolicyIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<PolicyDocument>> {
        if query.trim().is_empty() {
            return Err(DeskError::EmptyQuery);
        }

        let query_terms = terms(query);
        let mut scored: Vec<(usize, &Entry)> = self
            .entries
            .iter()
            .map(|e| (Self::score(e, &query_terms), e))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        tracing::debug!(query, hits = scored.len(), "Policy search");

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, e)| e.document.clone())
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| stem(&w))
        .collect()
}

/// Crude plural folding ("refunds" -> "refund")
fn stem(word: &str) -> String {
    match word.strip_suffix('s') {
        Some(base) if base.len() >= 3 && !base.ends_with('s') => base.to_string(),
        _ => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refund_question_finds_refund_policy() {
        let index = KeywordPolicyIndex::seeded();
        let hits = index.search("What is your refund policy?", 1).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].topic, "refund");
        assert!(hits[0].content.contains("7 business days"));
    }

    #[tokio::test]
    async fn test_topic_boost_ranks_named_topic_first() {
        let index = KeywordPolicyIndex::seeded();
        let hits = index.search("how do returns work", 3).await.unwrap();
        assert_eq!(hits[0].topic, "returns");
    }

    #[tokio::test]
    async fn test_shipping_terms_match() {
        let index = KeywordPolicyIndex::seeded();
        let hits = index.search("international delivery time", 1).await.unwrap();
        assert_eq!(hits[0].topic, "shipping");
    }

    #[tokio::test]
    async fn test_unrelated_query_is_empty() {
        let index = KeywordPolicyIndex::seeded();
        assert!(index.search("quantum chromodynamics", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_is_an_error() {
        let index = KeywordPolicyIndex::seeded();
        assert!(matches!(index.search("  ", 1).await, Err(DeskError::EmptyQuery)));
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("refunds"), "refund");
        assert_eq!(stem("business"), "business");
        assert_eq!(stem("is"), "is");
    }
}
