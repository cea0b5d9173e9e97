use crate::db::queries::IndexMeta;
use crate::pipeline::chunker::Chunk;

/// An index loaded into memory: every chunk with its embedding.
///
/// Chunks are stored in id order, so `chunks()[i].id == i` for an index read
/// back from disk.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    meta: IndexMeta,
}

impl VectorIndex {
    /// Pair chunks with embeddings. Fails when the lengths differ.
    pub fn new(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        meta: IndexMeta,
    ) -> anyhow::Result<Self> {
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            );
        }
        if let Some(bad) = embeddings.iter().position(|e| e.len() != meta.dimension) {
            anyhow::bail!(
                "embedding {bad} has dimension {}, expected {}",
                embeddings[bad].len(),
                meta.dimension
            );
        }
        Ok(Self {
            chunks,
            embeddings,
            meta,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Cosine similarity of `query` against every stored embedding, by position.
    pub fn similarities(&self, query: &[f32]) -> Vec<f32> {
        self.embeddings
            .iter()
            .map(|e| cosine_similarity(query, e))
            .collect()
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON { 0.0 } else { dot / denom }
}
