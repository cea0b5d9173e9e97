//! In-crate fakes for the model-backed seams.

#![allow(clippy::cast_possible_truncation)]

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::corpus::document::DocumentMetadata;
use crate::db::queries::IndexMeta;
use crate::embedding::{Embed, l2_normalize};
use crate::error::OracleError;
use crate::index::VectorIndex;
use crate::oracle::AnswerOracle;
use crate::pipeline::chunker::Chunk;
use crate::retrieval::Retriever;
use crate::retrieval::bm25::tokenize;

pub const HASHING_DIMENSION: usize = 64;

/// Bag-of-words embedder: each token is hashed into one of 64 buckets.
///
/// Deterministic, so texts sharing tokens have positive cosine similarity.
/// Counts `embed_batch` calls through a shared counter.
#[derive(Default)]
pub struct HashingEmbedder {
    calls: Arc<AtomicUsize>,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the call counter that survives moving the embedder.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; HASHING_DIMENSION];
        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % HASHING_DIMENSION as u64) as usize;
            v[bucket] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Embed for HashingEmbedder {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_id(&self) -> &str {
        "test/hashing-64"
    }

    fn dimension(&self) -> usize {
        HASHING_DIMENSION
    }
}

/// Embedder whose every call fails.
pub struct FailingEmbedder;

impl Embed for FailingEmbedder {
    fn embed_batch(&mut self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model session crashed")
    }

    fn model_id(&self) -> &str {
        "test/failing"
    }

    fn dimension(&self) -> usize {
        HASHING_DIMENSION
    }
}

fn test_chunk(id: usize, text: &str) -> Chunk {
    Chunk {
        id,
        chunk_index: 0,
        start: 0,
        text: text.to_string(),
        header: String::new(),
        metadata: DocumentMetadata::for_page(format!("doc{id}.pdf"), Some(1)),
    }
}

fn test_meta(dimension: usize, chunk_count: usize) -> IndexMeta {
    IndexMeta {
        fingerprint: "test".to_string(),
        model_id: "test".to_string(),
        dimension,
        chunk_count,
        built_at: String::new(),
    }
}

/// Index whose chunk `i` has text `entries[i].0` and embedding `entries[i].1`.
pub fn index_from_vectors(entries: &[(&str, Vec<f32>)]) -> VectorIndex {
    let dimension = entries.first().map_or(0, |(_, v)| v.len());
    let chunks = entries
        .iter()
        .enumerate()
        .map(|(i, (text, _))| test_chunk(i, text))
        .collect();
    let embeddings = entries.iter().map(|(_, v)| v.clone()).collect();
    VectorIndex::new(chunks, embeddings, test_meta(dimension, entries.len())).unwrap()
}

/// Index over `texts` embedded with `embedder`.
pub fn index_from_texts(texts: &[&str], embedder: &mut HashingEmbedder) -> VectorIndex {
    let chunks: Vec<Chunk> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| test_chunk(i, text))
        .collect();
    let embeddings = if texts.is_empty() {
        Vec::new()
    } else {
        embedder.embed_batch(texts).unwrap()
    };
    let meta = IndexMeta {
        model_id: embedder.model_id().to_string(),
        ..test_meta(HASHING_DIMENSION, texts.len())
    };
    VectorIndex::new(chunks, embeddings, meta).unwrap()
}

/// Oracle returning a fixed answer or error, recording every prompt.
pub struct ScriptedOracle {
    reply: Result<String, OracleError>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn answering(answer: &str) -> Self {
        Self {
            reply: Ok(answer.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: OracleError) -> Self {
        Self {
            reply: Err(error),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl AnswerOracle for ScriptedOracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.reply.clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Retriever that always returns the same chunks, recording each query.
pub struct FixedRetriever {
    chunks: Vec<Chunk>,
    fail_embedding: bool,
    queries: Mutex<Vec<String>>,
}

impl FixedRetriever {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            fail_embedding: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_with_embedding_error() -> Self {
        Self {
            fail_embedding: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl Retriever for FixedRetriever {
    fn retrieve(&self, query: &str) -> anyhow::Result<Vec<Chunk>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail_embedding {
            return Err(OracleError::Embedding("model session crashed".to_string()).into());
        }
        Ok(self.chunks.clone())
    }
}
