//! Hybrid retrieval: dense similarity, MMR diversity and BM25, fused by
//! weighted reciprocal rank.

pub mod bm25;
pub mod fusion;
pub mod mmr;
pub mod similarity;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::debug;

use crate::config::{RRF_K, RetrievalConfig};
use crate::embedding::Embed;
use crate::error::OracleError;
use crate::index::VectorIndex;
use crate::pipeline::chunker::Chunk;
use crate::qa::sanitize::unescape_html;
use bm25::Bm25Index;
use fusion::{RankedList, fuse};
use mmr::mmr_search;
use similarity::similarity_search;

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMethod {
    Similarity,
    Diversity,
    Lexical,
}

/// A scored hit from one strategy, identified by its position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub chunk_id: usize,
    pub score: f32,
    pub method: RetrievalMethod,
}

/// Produces the ordered, deduplicated chunks relevant to a query.
pub trait Retriever: Send + Sync {
    /// Errors from the embedding model are wrapped as [`OracleError`].
    fn retrieve(&self, query: &str) -> anyhow::Result<Vec<Chunk>>;
}

/// Runs all three strategies over one loaded index and fuses the rankings.
pub struct HybridRetriever {
    index: Arc<VectorIndex>,
    bm25: Bm25Index,
    embedder: Mutex<Box<dyn Embed>>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Box<dyn Embed>, config: RetrievalConfig) -> Self {
        let contents: Vec<String> = index.chunks().iter().map(Chunk::content).collect();
        let bm25 = Bm25Index::new(contents.iter().map(String::as_str));
        Self {
            index,
            bm25,
            embedder: Mutex::new(embedder),
            config,
        }
    }

    fn embed_query(&self, query: &str) -> anyhow::Result<Vec<f32>> {
        let mut embedder = self
            .embedder
            .lock()
            .map_err(|_| anyhow::anyhow!("embedder lock poisoned"))?;
        embedder
            .embed_one(query)
            .map_err(|e| OracleError::Embedding(format!("{e:#}")).into())
    }

    /// Fused chunk positions with their scores.
    pub fn ranked_ids(&self, query: &str) -> anyhow::Result<Vec<(usize, f32)>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let c = &self.config;
        let query_vec = self.embed_query(query)?;

        let lexical = self.bm25.search(&unescape_html(query), c.top_k);
        let similar = similarity_search(&self.index, &query_vec, c.top_k);
        let diverse = mmr_search(&self.index, &query_vec, c.top_k, c.fetch_k, c.mmr_lambda);

        let ids = |hits: &[Candidate]| hits.iter().map(|h| h.chunk_id).collect::<Vec<_>>();
        let (lexical_ids, similar_ids, diverse_ids) = (ids(&lexical), ids(&similar), ids(&diverse));
        let fused = fuse(
            &[
                RankedList {
                    weight: c.lexical_weight,
                    chunk_ids: &lexical_ids,
                },
                RankedList {
                    weight: c.similarity_weight,
                    chunk_ids: &similar_ids,
                },
                RankedList {
                    weight: c.diversity_weight,
                    chunk_ids: &diverse_ids,
                },
            ],
            RRF_K,
            c.max_results,
        );

        debug!(
            lexical = lexical.len(),
            similarity = similar.len(),
            diversity = diverse.len(),
            fused = fused.len(),
            "Hybrid retrieval complete"
        );
        Ok(fused)
    }
}

impl Retriever for HybridRetriever {
    fn retrieve(&self, query: &str) -> anyhow::Result<Vec<Chunk>> {
        self.ranked_ids(query)?
            .into_iter()
            .map(|(id, _)| {
                self.index
                    .chunks()
                    .get(id)
                    .cloned()
                    .with_context(|| format!("fused chunk id {id} is out of range"))
            })
            .collect()
    }
}
