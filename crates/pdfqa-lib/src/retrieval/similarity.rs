use super::{Candidate, RetrievalMethod};
use crate::index::VectorIndex;

/// Top-`k` chunks by cosine similarity to `query`, best first.
///
/// Equal scores keep storage order.
pub fn similarity_search(index: &VectorIndex, query: &[f32], k: usize) -> Vec<Candidate> {
    ranked_by_similarity(index, query)
        .into_iter()
        .take(k)
        .map(|(chunk_id, score)| Candidate {
            chunk_id,
            score,
            method: RetrievalMethod::Similarity,
        })
        .collect()
}

/// Every chunk position with its similarity, sorted best first.
pub(crate) fn ranked_by_similarity(index: &VectorIndex, query: &[f32]) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = index.similarities(query).into_iter().enumerate().collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}
