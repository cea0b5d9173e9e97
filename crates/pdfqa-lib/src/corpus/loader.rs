use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::corpus::document::{Document, DocumentMetadata};
use crate::corpus::pdf::read_pdf;
use crate::error::IngestionFailure;

/// Outcome of a corpus scan.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// One document per page of every successfully read PDF.
    pub documents: Vec<Document>,
    /// Number of PDF files attempted, including failures.
    pub files_processed: usize,
    pub failures: Vec<IngestionFailure>,
}

/// Recursively list every `.pdf` file under `root`, sorted by path.
///
/// The extension match is case-insensitive. A missing `root` yields an empty
/// list; unreadable subdirectories are logged and skipped.
pub fn discover_pdfs(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        debug!(root = %root.display(), "Corpus directory does not exist");
        return Vec::new();
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable corpus entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Load every PDF under `root` as one [`Document`] per page.
///
/// A file that fails to parse contributes zero documents and an entry in
/// [`LoadReport::failures`]; the scan continues with the next file.
pub fn load_documents(root: &Path) -> LoadReport {
    let mut report = LoadReport::default();

    for path in discover_pdfs(root) {
        report.files_processed += 1;
        match load_pdf(&path) {
            Ok(docs) => {
                debug!(
                    path = %path.display(),
                    pages = docs.len(),
                    files_processed = report.files_processed,
                    "Loaded PDF"
                );
                report.documents.extend(docs);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "Skipping unreadable PDF");
                report.failures.push(IngestionFailure {
                    path,
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    info!(
        root = %root.display(),
        files_processed = report.files_processed,
        files_failed = report.failures.len(),
        documents_loaded = report.documents.len(),
        "Corpus scan complete"
    );
    report
}

fn load_pdf(path: &Path) -> anyhow::Result<Vec<Document>> {
    let contents = read_pdf(path)?;
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    contents
        .pages
        .into_iter()
        .map(|(page_number, text)| {
            let metadata = DocumentMetadata {
                source_name: source_name.clone(),
                page_number: Some(page_number),
                title: contents.info.title.clone(),
                author: contents.info.author.clone(),
                subject: contents.info.subject.clone(),
                creation_date: contents.info.creation_date.clone(),
                mod_date: contents.info.mod_date.clone(),
            };
            Document::new(text, metadata)
        })
        .collect()
}
