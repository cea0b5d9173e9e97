//! Corpus ingest: decide whether the persisted index can be reused and
//! rebuild it when it cannot.

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::embedding::Embed;
use crate::error::{IndexError, IngestionFailure};
use crate::index::{IndexAction, IndexManager, VectorIndex};

/// What an ingest run did.
#[derive(Debug)]
pub struct IngestReport {
    pub index: Arc<VectorIndex>,
    pub action: IndexAction,
    pub failures: Vec<IngestionFailure>,
}

impl IngestReport {
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

/// Index manager for the paths and chunking settings in `config`.
pub fn index_manager(config: &AppConfig) -> IndexManager {
    IndexManager::new(
        config.paths.documents_path(),
        config.paths.index_path(),
        config.chunking.clone(),
    )
}

/// Load or rebuild the index described by `config`.
pub fn run_ingest(
    config: &AppConfig,
    embedder: &mut dyn Embed,
    force_rebuild: bool,
) -> Result<IngestReport, IndexError> {
    let manager = index_manager(config);
    info!(
        documents_dir = %manager.documents_dir().display(),
        index_dir = %manager.index_dir().display(),
        force_rebuild,
        "Preparing vector index"
    );

    let outcome = manager.get_or_build(force_rebuild, embedder)?;
    let report = IngestReport {
        index: Arc::new(outcome.index),
        action: outcome.action,
        failures: outcome.failures,
    };

    info!(
        action = ?report.action,
        chunk_count = report.chunk_count(),
        files_failed = report.failures.len(),
        "Vector index ready"
    );
    Ok(report)
}
