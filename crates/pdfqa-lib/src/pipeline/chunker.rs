use anyhow::Context;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::corpus::document::{Document, DocumentMetadata};

/// A window of page text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the corpus-wide chunk sequence.
    pub id: usize,
    /// Sequential window index within the parent page (0-based).
    pub chunk_index: usize,
    /// Byte offset of `text` within the parent page content.
    pub start: usize,
    /// The raw window, an exact substring of the parent page.
    pub text: String,
    /// Title/author/subject lines prepended for embedding, or empty.
    pub header: String,
    pub metadata: DocumentMetadata,
}

impl Chunk {
    /// Text that is embedded, indexed for BM25 and handed to the oracle.
    pub fn content(&self) -> String {
        if self.header.is_empty() {
            self.text.clone()
        } else {
            format!("{}{}", self.header, self.text)
        }
    }
}

/// Build the metadata header for a page, e.g. `"Title: X\nAuthor: Y\n\n"`.
///
/// Returns an empty string when no info field is set.
pub fn metadata_header(meta: &DocumentMetadata) -> String {
    let mut header = String::new();
    for (label, value) in [
        ("Title", &meta.title),
        ("Author", &meta.author),
        ("Subject", &meta.subject),
    ] {
        if !value.trim().is_empty() {
            header.push_str(&format!("{label}: {}\n", value.trim()));
        }
    }
    if !header.is_empty() {
        header.push('\n');
    }
    header
}

/// Split page documents into overlapping windows.
///
/// Windows break at the coarsest boundary that fits (blank line, line break,
/// sentence, word, then character) and never exceed `chunk_size`
/// characters unless a single grapheme forces it. Whitespace is kept so the
/// windows, with overlaps removed, reproduce each page exactly. Pages with
/// only whitespace produce no chunks.
pub fn split_documents(
    documents: &[Document],
    config: &ChunkingConfig,
) -> anyhow::Result<Vec<Chunk>> {
    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .context("Invalid chunk overlap")?
        .with_trim(false);
    let splitter = TextSplitter::new(chunk_config);

    let mut chunks = Vec::new();
    for doc in documents {
        if doc.content().trim().is_empty() {
            continue;
        }
        let header = if config.metadata_header {
            metadata_header(doc.metadata())
        } else {
            String::new()
        };

        for (chunk_index, (start, window)) in splitter.chunk_indices(doc.content()).enumerate() {
            chunks.push(Chunk {
                id: chunks.len(),
                chunk_index,
                start,
                text: window.to_string(),
                header: header.clone(),
                metadata: doc.metadata().clone(),
            });
        }
    }

    debug!(
        documents = documents.len(),
        chunks = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Split documents into chunks"
    );
    Ok(chunks)
}
