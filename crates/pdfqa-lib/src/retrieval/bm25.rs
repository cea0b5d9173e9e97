#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use super::{Candidate, RetrievalMethod};

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// Okapi BM25 over an in-memory corpus of chunk texts.
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    /// Term frequencies per document, by position.
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    doc_freqs: HashMap<String, usize>,
    avg_doc_len: f32,
}

/// Lowercase alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl Bm25Index {
    pub fn new<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for text in texts {
            let tokens = tokenize(text);
            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in tokens.iter() {
                *tf.entry(token.clone()).or_default() += 1;
            }
            for term in tf.keys() {
                *index.doc_freqs.entry(term.clone()).or_default() += 1;
            }
            index.doc_lens.push(tokens.len());
            index.term_freqs.push(tf);
        }
        let total: usize = index.doc_lens.iter().sum();
        index.avg_doc_len = if index.doc_lens.is_empty() {
            0.0
        } else {
            total as f32 / index.doc_lens.len() as f32
        };
        index
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.len() as f32;
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// BM25 score of every document for `query`, by position.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();

        let avg = if self.avg_doc_len > 0.0 {
            self.avg_doc_len
        } else {
            1.0
        };
        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(tf, &len)| {
                terms
                    .iter()
                    .filter_map(|term| tf.get(term).map(|&f| (term, f as f32)))
                    .map(|(term, f)| {
                        let norm = K1 * (1.0 - B + B * len as f32 / avg);
                        self.idf(term) * f * (K1 + 1.0) / (f + norm)
                    })
                    .sum()
            })
            .collect()
    }

    /// Top-`k` documents by BM25 score, best first. Documents sharing no
    /// term with the query are never returned.
    pub fn search(&self, query: &str, k: usize) -> Vec<Candidate> {
        let mut scored: Vec<(usize, f32)> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(k)
            .map(|(chunk_id, score)| Candidate {
                chunk_id,
                score,
                method: RetrievalMethod::Lexical,
            })
            .collect()
    }
}
