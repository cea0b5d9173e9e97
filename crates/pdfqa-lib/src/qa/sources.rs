use std::collections::{BTreeMap, BTreeSet};

use crate::pipeline::chunker::Chunk;

/// Appended to an answer that no retrieved source supports.
pub const NO_SOURCES_WARNING: &str = "\n\n⚠️ No supporting sources were retrieved for this answer.";

/// Citation lines for the retrieved chunks.
///
/// Chunks are grouped by source name with their page numbers collected,
/// sources sorted alphabetically and capped at `limit`. Each line reads
/// `"A.pdf (pages 3, 5)"`, or just `"A.pdf"` when no page is known.
pub fn format_sources(chunks: &[Chunk], limit: usize) -> Vec<String> {
    let mut pages_by_source: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for chunk in chunks {
        let pages = pages_by_source
            .entry(chunk.metadata.source_name.as_str())
            .or_default();
        if let Some(page) = chunk.metadata.page_number {
            pages.insert(page);
        }
    }

    pages_by_source
        .into_iter()
        .take(limit)
        .map(|(source, pages)| {
            if pages.is_empty() {
                source.to_string()
            } else {
                let pages: Vec<String> = pages.iter().map(u32::to_string).collect();
                format!("{source} (pages {})", pages.join(", "))
            }
        })
        .collect()
}

/// Append [`NO_SOURCES_WARNING`] when `sources` is empty.
pub fn with_source_warning(answer: String, sources: &[String]) -> String {
    if sources.is_empty() {
        format!("{answer}{NO_SOURCES_WARNING}")
    } else {
        answer
    }
}
