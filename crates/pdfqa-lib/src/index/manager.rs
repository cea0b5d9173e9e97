use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::config::{ChunkingConfig, EMBED_BATCH_SIZE};
use crate::corpus::loader::load_documents;
use crate::db::connection::{open_db, open_db_read_only};
use crate::db::queries::{self, IndexMeta};
use crate::embedding::Embed;
use crate::error::IndexError;
use crate::index::fingerprint::corpus_fingerprint;
use crate::index::vector::VectorIndex;
use crate::pipeline::chunker::{Chunk, split_documents};

/// File name of the persisted index inside the index directory.
pub const INDEX_FILE: &str = "index.sqlite3";

/// Extensions that mark a directory as holding a usable index.
const ARTIFACT_EXTENSIONS: [&str; 6] = ["sqlite3", "sqlite", "db", "bin", "pkl", "parquet"];

/// Whether `dir` exists and contains at least one recognized index artifact.
///
/// Never fails: unreadable or missing directories are simply not valid.
pub fn is_valid(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    ARTIFACT_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
    })
}

/// Embed `chunks` and persist them as a fresh index in `dir`.
///
/// The database is written to a temporary file and renamed over any previous
/// index, so a failed build leaves the old index untouched.
pub fn build(
    chunks: Vec<Chunk>,
    dir: &Path,
    embedder: &mut dyn Embed,
    fingerprint: &str,
) -> anyhow::Result<VectorIndex> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create index directory {}", dir.display()))?;
    let final_path = dir.join(INDEX_FILE);
    let tmp_path = dir.join(format!("{INDEX_FILE}.tmp"));
    if tmp_path.exists() {
        fs::remove_file(&tmp_path)
            .with_context(|| format!("Failed to remove stale {}", tmp_path.display()))?;
    }

    let dimension = embedder.dimension();
    let mut embeddings = Vec::with_capacity(chunks.len());
    for (batch_no, batch) in chunks.chunks(EMBED_BATCH_SIZE).enumerate() {
        let contents: Vec<String> = batch.iter().map(Chunk::content).collect();
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        let vectors = embedder
            .embed_batch(&refs)
            .with_context(|| format!("Failed to embed batch {batch_no}"))?;
        if vectors.len() != batch.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            );
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            anyhow::bail!(
                "Embedder returned dimension {}, expected {dimension}",
                bad.len()
            );
        }
        embeddings.extend(vectors);
        debug!(
            embedded = embeddings.len(),
            total = chunks.len(),
            "Embedded chunk batch"
        );
    }

    let meta = IndexMeta {
        fingerprint: fingerprint.to_string(),
        model_id: embedder.model_id().to_string(),
        dimension,
        chunk_count: chunks.len(),
        built_at: jiff::Timestamp::now().to_string(),
    };

    {
        let mut conn = open_db(&tmp_path)?;
        let tx = conn.transaction()?;
        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            queries::insert_chunk(&tx, chunk, embedding)?;
        }
        queries::write_meta(&tx, &meta)?;
        tx.commit().context("Failed to commit index build")?;
    }

    fs::rename(&tmp_path, &final_path).with_context(|| {
        format!(
            "Failed to move {} into place at {}",
            tmp_path.display(),
            final_path.display()
        )
    })?;

    info!(
        path = %final_path.display(),
        chunk_count = meta.chunk_count,
        model_id = %meta.model_id,
        "Built vector index"
    );
    VectorIndex::new(chunks, embeddings, meta)
}

/// Open the index persisted in `dir` without embedding anything.
pub fn load(dir: &Path) -> Result<VectorIndex, IndexError> {
    let path = dir.join(INDEX_FILE);
    let corrupt = |reason: String| IndexError::Corrupt {
        path: path.clone(),
        reason,
    };

    if !path.is_file() {
        return Err(corrupt(format!("{INDEX_FILE} is missing")));
    }
    let conn = open_db_read_only(&path).map_err(|e| corrupt(format!("{e:#}")))?;
    let meta = queries::read_meta(&conn)
        .map_err(|e| corrupt(format!("{e:#}")))?
        .ok_or_else(|| corrupt("no completed build recorded".to_string()))?;
    let rows = queries::load_chunks(&conn).map_err(|e| corrupt(format!("{e:#}")))?;
    if rows.len() != meta.chunk_count {
        return Err(corrupt(format!(
            "expected {} chunks, found {}",
            meta.chunk_count,
            rows.len()
        )));
    }
    if let Some(pos) = rows.iter().enumerate().position(|(i, (c, _))| c.id != i) {
        return Err(corrupt(format!("chunk ids are not contiguous at {pos}")));
    }

    let (chunks, embeddings): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
    let index =
        VectorIndex::new(chunks, embeddings, meta).map_err(|e| corrupt(format!("{e:#}")))?;
    debug!(path = %path.display(), chunk_count = index.len(), "Loaded vector index");
    Ok(index)
}

/// Whether the index was reused from disk or rebuilt by this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    Reused,
    Built,
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub index: VectorIndex,
    pub action: IndexAction,
    /// PDFs that could not be read during a rebuild. Empty on reuse.
    pub failures: Vec<crate::error::IngestionFailure>,
}

/// Snapshot of the persisted index for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatus {
    pub path: PathBuf,
    pub valid: bool,
    pub meta: Option<IndexMeta>,
    /// `None` when either side of the comparison is unavailable.
    pub fingerprint_matches: Option<bool>,
}

/// Decides between reusing the persisted index and rebuilding it.
#[derive(Debug, Clone)]
pub struct IndexManager {
    documents_dir: PathBuf,
    index_dir: PathBuf,
    chunking: ChunkingConfig,
}

impl IndexManager {
    pub fn new(documents_dir: PathBuf, index_dir: PathBuf, chunking: ChunkingConfig) -> Self {
        Self {
            documents_dir,
            index_dir,
            chunking,
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// Load the persisted index when it is valid and current, otherwise run
    /// the full ingest (load, chunk, embed, persist).
    ///
    /// An index is current when its stored fingerprint matches the corpus on
    /// disk. If the corpus directory is gone, a valid index is reused as-is.
    pub fn get_or_build(
        &self,
        force_rebuild: bool,
        embedder: &mut dyn Embed,
    ) -> Result<IndexOutcome, IndexError> {
        let fingerprint = corpus_fingerprint(&self.documents_dir, embedder.model_id(), &self.chunking)
            .map_err(IndexError::Build)?;

        if force_rebuild {
            info!(path = %self.index_dir.display(), "Forced index rebuild");
        } else if is_valid(&self.index_dir) {
            match load(&self.index_dir) {
                Ok(index) => match &fingerprint {
                    None => {
                        warn!(
                            documents_dir = %self.documents_dir.display(),
                            "Corpus directory is missing; reusing existing index"
                        );
                        return Ok(reused(index));
                    }
                    Some(current) if *current == index.meta().fingerprint => {
                        info!(chunk_count = index.len(), "Reusing persisted index");
                        return Ok(reused(index));
                    }
                    Some(_) => {
                        warn!("Corpus or build parameters changed since last build; rebuilding");
                    }
                },
                Err(e) => warn!(error = %e, "Persisted index is unusable; rebuilding"),
            }
        } else {
            info!(path = %self.index_dir.display(), "No persisted index found; building");
        }

        let Some(fingerprint) = fingerprint else {
            return Err(IndexError::NoCorpus {
                path: self.documents_dir.clone(),
            });
        };
        self.rebuild(&fingerprint, embedder)
    }

    fn rebuild(
        &self,
        fingerprint: &str,
        embedder: &mut dyn Embed,
    ) -> Result<IndexOutcome, IndexError> {
        let report = load_documents(&self.documents_dir);
        let chunks =
            split_documents(&report.documents, &self.chunking).map_err(IndexError::Build)?;
        if chunks.is_empty() {
            return Err(IndexError::NoCorpus {
                path: self.documents_dir.clone(),
            });
        }

        let index =
            build(chunks, &self.index_dir, embedder, fingerprint).map_err(IndexError::Build)?;
        Ok(IndexOutcome {
            index,
            action: IndexAction::Built,
            failures: report.failures,
        })
    }

    /// Describe the persisted index without loading embeddings.
    pub fn status(&self, model_id: &str) -> anyhow::Result<IndexStatus> {
        let path = self.index_dir.join(INDEX_FILE);
        let valid = is_valid(&self.index_dir);
        let meta = if path.is_file() {
            let conn = open_db_read_only(&path)?;
            queries::read_meta(&conn)?
        } else {
            None
        };
        let current = corpus_fingerprint(&self.documents_dir, model_id, &self.chunking)?;
        let fingerprint_matches = match (&meta, current) {
            (Some(meta), Some(current)) => Some(meta.fingerprint == current),
            _ => None,
        };
        Ok(IndexStatus {
            path,
            valid,
            meta,
            fingerprint_matches,
        })
    }
}

fn reused(index: VectorIndex) -> IndexOutcome {
    IndexOutcome {
        index,
        action: IndexAction::Reused,
        failures: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pdfqa_test_util::pdf::{PdfFixture, write_pdf};

    use super::*;
    use crate::test_util::HashingEmbedder;

    struct Fixture {
        _tmp: tempfile::TempDir,
        documents: PathBuf,
        manager: IndexManager,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let documents = tmp.path().join("documents");
        std::fs::create_dir_all(documents.join("nested")).unwrap();
        write_pdf(
            &documents.join("alpha.pdf"),
            &PdfFixture::pages(&["Reservoir pressure limits", "Valve maintenance schedule"]),
        );
        write_pdf(
            &documents.join("nested").join("beta.pdf"),
            &PdfFixture::pages(&["Quarterly revenue summary"]),
        );
        let manager = IndexManager::new(
            documents.clone(),
            tmp.path().join("databases").join("chroma_db"),
            ChunkingConfig::default(),
        );
        Fixture {
            _tmp: tmp,
            documents,
            manager,
        }
    }

    #[test]
    fn is_valid_is_false_for_missing_or_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_valid(&tmp.path().join("absent")));
        assert!(!is_valid(tmp.path()));
        std::fs::write(tmp.path().join("README.txt"), b"x").unwrap();
        assert!(!is_valid(tmp.path()));
    }

    #[test]
    fn is_valid_recognizes_artifact_extensions() {
        for name in ["index.sqlite3", "data_level0.BIN", "index.pkl", "x.parquet"] {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::write(tmp.path().join(name), b"x").unwrap();
            assert!(is_valid(tmp.path()), "{name} should be recognized");
        }
    }

    #[test]
    fn first_call_builds_and_persists() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();

        let outcome = f.manager.get_or_build(false, &mut embedder).unwrap();
        assert_eq!(outcome.action, IndexAction::Built);
        assert_eq!(outcome.index.len(), 3);
        assert!(is_valid(f.manager.index_dir()));
        assert!(!f.manager.index_dir().join("index.sqlite3.tmp").exists());
        assert_eq!(outcome.index.meta().model_id, embedder.model_id());
        assert_eq!(outcome.index.meta().chunk_count, 3);
    }

    #[test]
    fn second_call_reuses_without_embedding() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();
        let calls = embedder.calls();

        f.manager.get_or_build(false, &mut embedder).unwrap();
        let after_build = calls.load(Ordering::SeqCst);
        assert!(after_build > 0);

        let outcome = f.manager.get_or_build(false, &mut embedder).unwrap();
        assert_eq!(outcome.action, IndexAction::Reused);
        assert_eq!(outcome.index.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), after_build);
    }

    #[test]
    fn loaded_index_matches_built_index() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();
        let built = f.manager.get_or_build(false, &mut embedder).unwrap().index;
        let loaded = load(f.manager.index_dir()).unwrap();

        assert_eq!(loaded.chunks(), built.chunks());
        assert_eq!(loaded.embeddings(), built.embeddings());
        assert_eq!(loaded.meta(), built.meta());
    }

    #[test]
    fn force_rebuild_embeds_again() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();
        let calls = embedder.calls();

        f.manager.get_or_build(false, &mut embedder).unwrap();
        let after_build = calls.load(Ordering::SeqCst);
        let outcome = f.manager.get_or_build(true, &mut embedder).unwrap();
        assert_eq!(outcome.action, IndexAction::Built);
        assert!(calls.load(Ordering::SeqCst) > after_build);
    }

    #[test]
    fn corpus_change_triggers_rebuild() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();
        f.manager.get_or_build(false, &mut embedder).unwrap();

        write_pdf(
            &f.documents.join("gamma.pdf"),
            &PdfFixture::pages(&["Safety incident report"]),
        );
        let outcome = f.manager.get_or_build(false, &mut embedder).unwrap();
        assert_eq!(outcome.action, IndexAction::Built);
        assert_eq!(outcome.index.len(), 4);
    }

    #[test]
    fn missing_corpus_reuses_valid_index() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();
        f.manager.get_or_build(false, &mut embedder).unwrap();

        std::fs::remove_dir_all(&f.documents).unwrap();
        let outcome = f.manager.get_or_build(false, &mut embedder).unwrap();
        assert_eq!(outcome.action, IndexAction::Reused);
        assert_eq!(outcome.index.len(), 3);
    }

    #[test]
    fn no_corpus_and_no_index_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = IndexManager::new(
            tmp.path().join("documents"),
            tmp.path().join("index"),
            ChunkingConfig::default(),
        );
        let err = manager
            .get_or_build(false, &mut HashingEmbedder::new())
            .unwrap_err();
        assert!(matches!(err, IndexError::NoCorpus { .. }));
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let documents = tmp.path().join("documents");
        std::fs::create_dir_all(&documents).unwrap();
        let manager =
            IndexManager::new(documents, tmp.path().join("index"), ChunkingConfig::default());
        let err = manager
            .get_or_build(false, &mut HashingEmbedder::new())
            .unwrap_err();
        assert!(matches!(err, IndexError::NoCorpus { .. }));
        assert!(!is_valid(&tmp.path().join("index")));
    }

    #[test]
    fn corrupt_index_is_rebuilt() {
        let f = fixture();
        std::fs::create_dir_all(f.manager.index_dir()).unwrap();
        std::fs::write(f.manager.index_dir().join(INDEX_FILE), b"not a database").unwrap();
        assert!(is_valid(f.manager.index_dir()));
        assert!(matches!(
            load(f.manager.index_dir()),
            Err(IndexError::Corrupt { .. })
        ));

        let outcome = f
            .manager
            .get_or_build(false, &mut HashingEmbedder::new())
            .unwrap();
        assert_eq!(outcome.action, IndexAction::Built);
        assert_eq!(load(f.manager.index_dir()).unwrap().len(), 3);
    }

    #[test]
    fn unreadable_pdf_is_reported_not_fatal() {
        let f = fixture();
        std::fs::write(f.documents.join("broken.pdf"), b"garbage").unwrap();
        let outcome = f
            .manager
            .get_or_build(false, &mut HashingEmbedder::new())
            .unwrap();
        assert_eq!(outcome.index.len(), 3);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn status_reports_fingerprint_match() {
        let f = fixture();
        let mut embedder = HashingEmbedder::new();
        let before = f.manager.status(embedder.model_id()).unwrap();
        assert!(!before.valid);
        assert_eq!(before.meta, None);
        assert_eq!(before.fingerprint_matches, None);

        f.manager.get_or_build(false, &mut embedder).unwrap();
        let after = f.manager.status(embedder.model_id()).unwrap();
        assert!(after.valid);
        assert_eq!(after.meta.unwrap().chunk_count, 3);
        assert_eq!(after.fingerprint_matches, Some(true));

        write_pdf(&f.documents.join("new.pdf"), &PdfFixture::pages(&["New"]));
        let stale = f.manager.status(embedder.model_id()).unwrap();
        assert_eq!(stale.fingerprint_matches, Some(false));
    }
}
