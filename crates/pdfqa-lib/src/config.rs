use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Number of chunk texts sent to the embedding model per call.
pub const EMBED_BATCH_SIZE: usize = 64;

/// Maximum window size in characters for a single chunk.
pub const CHUNK_SIZE_CHARS: usize = 1024;

/// Number of characters shared between adjacent chunks of the same page.
pub const CHUNK_OVERLAP_CHARS: usize = 256;

/// Number of chunks each retrieval strategy returns.
pub const DEFAULT_TOP_K: usize = 6;

/// Multiplier for the MMR candidate pool.
///
/// MMR first fetches `k * MMR_FETCH_MULTIPLIER` nearest neighbours, then
/// greedily picks `k` of them.
pub const MMR_FETCH_MULTIPLIER: usize = 4;

/// Relevance weight for MMR. `1.0` degenerates to plain similarity search.
pub const MMR_LAMBDA: f32 = 0.8;

/// Fusion weight for the BM25 ranking.
pub const LEXICAL_WEIGHT: f32 = 0.4;

/// Fusion weight for the cosine similarity ranking.
pub const SIMILARITY_WEIGHT: f32 = 0.4;

/// Fusion weight for the MMR ranking.
pub const DIVERSITY_WEIGHT: f32 = 0.2;

/// Smoothing constant for reciprocal rank fusion.
pub const RRF_K: f32 = 60.0;

/// Number of distinct answers kept in the query cache.
pub const QUERY_CACHE_CAPACITY: usize = 100;

/// Maximum accepted query length in characters.
pub const MAX_QUERY_CHARS: usize = 2000;

/// Number of distinct source documents listed under an answer.
pub const DISPLAY_SOURCES: usize = 3;

/// Ollama model used for answer synthesis.
pub const ORACLE_MODEL: &str = "mistral";

/// Default Ollama endpoint.
pub const ORACLE_BASE_URL: &str = "http://localhost:11434";

pub const ORACLE_TEMPERATURE: f32 = 0.1;
pub const ORACLE_NUM_CTX: u32 = 4096;
pub const ORACLE_NUM_BATCH: u32 = 32;
pub const ORACLE_NUM_THREAD: u32 = 6;

/// Seconds to wait for a completion before giving up.
pub const ORACLE_TIMEOUT_SECS: u64 = 120;

/// Corpus directory, relative to the base directory.
pub const DOCUMENTS_DIR: &str = "documents";

/// Persisted index directory, relative to the base directory.
pub const INDEX_DIR: &str = "databases/chroma_db";

/// Resolved configuration for a pdfqa process.
///
/// Every section falls back to the constants above, so an empty JSON object
/// is a valid configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub qa: QaConfig,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root every relative path below is resolved against.
    pub base_dir: PathBuf,
    pub documents_dir: PathBuf,
    pub index_dir: PathBuf,
    /// Directory holding downloaded embedding model files.
    pub model_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            documents_dir: PathBuf::from(DOCUMENTS_DIR),
            index_dir: PathBuf::from(INDEX_DIR),
            model_dir: default_model_dir(),
        }
    }
}

impl PathsConfig {
    pub fn documents_path(&self) -> PathBuf {
        self.base_dir.join(&self.documents_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join(&self.index_dir)
    }
}

/// `~/.pdfqa/models`, or a relative `.pdfqa/models` when no home directory
/// can be determined.
pub fn default_model_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".pdfqa")
        .join("models")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Prepend title/author/subject lines to the text that gets embedded.
    pub metadata_header: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE_CHARS,
            chunk_overlap: CHUNK_OVERLAP_CHARS,
            metadata_header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub fetch_k: usize,
    pub mmr_lambda: f32,
    pub lexical_weight: f32,
    pub similarity_weight: f32,
    pub diversity_weight: f32,
    /// Cap on the fused candidate list handed to the oracle.
    pub max_results: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            fetch_k: DEFAULT_TOP_K * MMR_FETCH_MULTIPLIER,
            mmr_lambda: MMR_LAMBDA,
            lexical_weight: LEXICAL_WEIGHT,
            similarity_weight: SIMILARITY_WEIGHT,
            diversity_weight: DIVERSITY_WEIGHT,
            max_results: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub max_query_chars: usize,
    pub cache_capacity: usize,
    pub display_sources: usize,
    /// Deadline for a whole `submit_query` call, including retrieval.
    pub request_timeout_secs: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            max_query_chars: MAX_QUERY_CHARS,
            cache_capacity: QUERY_CACHE_CAPACITY,
            display_sources: DISPLAY_SOURCES,
            request_timeout_secs: ORACLE_TIMEOUT_SECS + 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub num_ctx: u32,
    pub num_batch: u32,
    pub num_thread: u32,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: ORACLE_BASE_URL.to_string(),
            model: ORACLE_MODEL.to_string(),
            temperature: ORACLE_TEMPERATURE,
            num_ctx: ORACLE_NUM_CTX,
            num_batch: ORACLE_NUM_BATCH,
            num_thread: ORACLE_NUM_THREAD,
            timeout_secs: ORACLE_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            anyhow::bail!("chunking.chunk_size must be greater than zero");
        }
        if c.chunk_overlap >= c.chunk_size {
            anyhow::bail!(
                "chunking.chunk_overlap ({}) must be less than chunking.chunk_size ({})",
                c.chunk_overlap,
                c.chunk_size
            );
        }

        let r = &self.retrieval;
        if r.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be greater than zero");
        }
        if r.fetch_k < r.top_k {
            anyhow::bail!(
                "retrieval.fetch_k ({}) must be at least retrieval.top_k ({})",
                r.fetch_k,
                r.top_k
            );
        }
        if !(0.0..=1.0).contains(&r.mmr_lambda) {
            anyhow::bail!("retrieval.mmr_lambda must be within [0, 1]");
        }
        let weights = [r.lexical_weight, r.similarity_weight, r.diversity_weight];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            anyhow::bail!("retrieval weights must be finite and non-negative");
        }
        if weights.iter().sum::<f32>() <= 0.0 {
            anyhow::bail!("at least one retrieval weight must be positive");
        }
        if r.max_results == 0 {
            anyhow::bail!("retrieval.max_results must be greater than zero");
        }

        let q = &self.qa;
        if q.max_query_chars == 0 {
            anyhow::bail!("qa.max_query_chars must be greater than zero");
        }
        if q.cache_capacity == 0 {
            anyhow::bail!("qa.cache_capacity must be greater than zero");
        }
        Ok(())
    }
}
