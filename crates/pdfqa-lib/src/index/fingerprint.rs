use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::config::ChunkingConfig;
use crate::corpus::loader::discover_pdfs;

/// Digest of everything an index build depends on.
///
/// Covers each PDF's path relative to `documents_dir` and its content hash,
/// the embedding model id, and the chunking parameters. Returns `None` when
/// the corpus directory does not exist, so callers can tell "no corpus" from
/// "empty corpus".
pub fn corpus_fingerprint(
    documents_dir: &Path,
    model_id: &str,
    chunking: &ChunkingConfig,
) -> anyhow::Result<Option<String>> {
    if !documents_dir.is_dir() {
        return Ok(None);
    }

    let mut hasher = Sha256::new();
    hasher.update(b"pdfqa-index-v1\0");
    hasher.update(model_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(
        format!(
            "{}:{}:{}",
            chunking.chunk_size, chunking.chunk_overlap, chunking.metadata_header
        )
        .as_bytes(),
    );

    for path in discover_pdfs(documents_dir) {
        let relative = path.strip_prefix(documents_dir).unwrap_or(&path);
        hasher.update(b"\0");
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(file_hash(&path)?.as_bytes());
    }

    Ok(Some(format!("{:x}", hasher.finalize())))
}

fn file_hash(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}
