//! Wiring of a loaded index into a ready-to-use QA orchestrator.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::embedding::Embed;
use crate::index::VectorIndex;
use crate::oracle::AnswerOracle;
use crate::qa::{QaOrchestrator, QueryCache};
use crate::retrieval::HybridRetriever;

/// Build the hybrid retriever and orchestrator over `index`.
///
/// `embedder` must be the model the index was built with; it is reused for
/// query embeddings.
pub fn build_orchestrator(
    config: &AppConfig,
    index: Arc<VectorIndex>,
    embedder: Box<dyn Embed>,
    oracle: Arc<dyn AnswerOracle>,
) -> anyhow::Result<QaOrchestrator> {
    if embedder.model_id() != index.meta().model_id {
        anyhow::bail!(
            "index was built with '{}' but the loaded model is '{}'; run 'pdfqa ingest --force'",
            index.meta().model_id,
            embedder.model_id()
        );
    }
    let retriever = HybridRetriever::new(index, embedder, config.retrieval.clone());
    Ok(QaOrchestrator::new(
        Arc::new(retriever),
        oracle,
        Arc::new(QueryCache::new(config.qa.cache_capacity)),
        config.qa.clone(),
    ))
}
