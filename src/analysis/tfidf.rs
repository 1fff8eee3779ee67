//! Tokenizer and TF-IDF term index over a small reference corpus.

use std::collections::{HashMap, HashSet};

use crate::models::ThreatCategory;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "do", "for", "from", "has",
    "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on",
    "or", "our", "she", "so", "that", "the", "their", "them", "then", "there", "they", "this", "to",
    "us", "was", "we", "were", "will", "with", "you", "your",
];

/// Lowercase alphanumeric runs with stop-words removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Document frequencies and per-category centroid vectors
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    document_count: usize,
    document_frequency: HashMap<String, usize>,
    centroids: HashMap<ThreatCategory, Centroid>,
}

/// Summed tf-idf vector of a category's reference documents
#[derive(Debug, Clone, Default)]
struct Centroid {
    weights: HashMap<String, f64>,
    norm: f64,
}

impl TfIdfIndex {
    /// Build the index from `(category, document)` pairs
    pub fn build<'a, I>(corpus: I) -> Self
    where
        I: IntoIterator<Item = (ThreatCategory, &'a str)>,
    {
        let documents: Vec<(ThreatCategory, Vec<String>)> = corpus
            .into_iter()
            .map(|(category, document)| (category, tokenize(document)))
            .collect();

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for (_, tokens) in &documents {
            let terms: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in terms {
                *document_frequency.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let mut index = Self {
            document_count: documents.len(),
            document_frequency,
            centroids: HashMap::new(),
        };

        let mut centroids: HashMap<ThreatCategory, Centroid> = HashMap::new();
        for (category, tokens) in &documents {
            let centroid = centroids.entry(*category).or_default();
            for (term, weight) in index.weigh(tokens) {
                *centroid.weights.entry(term.to_string()).or_insert(0.0) += weight;
            }
        }
        for centroid in centroids.values_mut() {
            centroid.norm = centroid.weights.values().map(|w| w * w).sum::<f64>().sqrt();
        }

        index.centroids = centroids;
        index
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// `ln((1 + N) / (1 + df)) + 1`
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.document_frequency.get(term).copied().unwrap_or(0);
        ((1.0 + self.document_count as f64) / (1.0 + df as f64)).ln() + 1.0
    }

    /// `tf × idf` per distinct term, with tf as `count / total_tokens`
    fn weigh<'t>(&self, tokens: &'t [String]) -> HashMap<&'t str, f64> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let total = tokens.len() as f64;
        counts
            .into_iter()
            .map(|(term, count)| (term, (count as f64 / total) * self.idf(term)))
            .collect()
    }

    /// Cosine similarity between the input's tf-idf vector and the
    /// category centroid, in `[0, 1]`
    ///
    /// Input terms outside the category vocabulary still count towards the
    /// input's norm, so a short text sharing a word or two with the corpus
    /// stays well below a text that reads like the reference documents.
    pub fn score(&self, category: ThreatCategory, tokens: &[String]) -> f64 {
        let Some(centroid) = self.centroids.get(&category) else {
            return 0.0;
        };
        if tokens.is_empty() || centroid.norm == 0.0 {
            return 0.0;
        }

        let input = self.weigh(tokens);
        let norm = input.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return 0.0;
        }

        let dot: f64 = input
            .iter()
            .filter_map(|(term, weight)| centroid.weights.get(*term).map(|c| c * weight))
            .sum();

        (dot / (norm * centroid.norm)).clamp(0.0, 1.0)
    }
}
