//! Maximal marginal relevance selection.
//!
//! Each step picks the candidate maximizing
//! `lambda * sim(query, d) - (1 - lambda) * max(sim(d, s) for s in selected)`.

use super::similarity::ranked_by_similarity;
use super::{Candidate, RetrievalMethod};
use crate::index::VectorIndex;
use crate::index::vector::cosine_similarity;

/// Select `k` chunks from the `fetch_k` most similar, trading relevance for
/// novelty by `lambda` (1.0 is pure relevance).
///
/// Candidates are returned in selection order with their marginal score.
pub fn mmr_search(
    index: &VectorIndex,
    query: &[f32],
    k: usize,
    fetch_k: usize,
    lambda: f32,
) -> Vec<Candidate> {
    let pool: Vec<(usize, f32)> = ranked_by_similarity(index, query)
        .into_iter()
        .take(fetch_k.max(k))
        .collect();
    let embeddings = index.embeddings();

    let mut remaining = pool;
    let mut selected: Vec<Candidate> = Vec::with_capacity(k.min(remaining.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best: Option<(usize, f32)> = None;
        for (pos, &(chunk_id, relevance)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(&embeddings[chunk_id], &embeddings[s.chunk_id]))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if redundancy.is_finite() { redundancy } else { 0.0 };
            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((pos, score));
            }
        }
        let Some((pos, score)) = best else { break };
        let (chunk_id, _) = remaining.remove(pos);
        selected.push(Candidate {
            chunk_id,
            score,
            method: RetrievalMethod::Diversity,
        });
    }

    selected
}
