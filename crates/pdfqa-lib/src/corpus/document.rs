use serde::{Deserialize, Serialize};

/// Provenance of a page of text.
///
/// Optional PDF info fields are empty strings when the source file does not
/// carry them, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Base file name of the PDF, e.g. `report.pdf`.
    pub source_name: String,
    /// 1-based page number within the PDF.
    pub page_number: Option<u32>,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creation_date: String,
    pub mod_date: String,
}

#[cfg(test)]
impl DocumentMetadata {
    /// Metadata for a page with no PDF info fields.
    pub fn for_page(source_name: impl Into<String>, page_number: Option<u32>) -> Self {
        Self {
            source_name: source_name.into(),
            page_number,
            ..Self::default()
        }
    }
}

/// The text of one PDF page plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
    metadata: DocumentMetadata,
}

impl Document {
    /// Create a document. Fails when the metadata has no source name.
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> anyhow::Result<Self> {
        if metadata.source_name.trim().is_empty() {
            anyhow::bail!("document metadata requires a source name");
        }
        Ok(Self {
            content: content.into(),
            metadata,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }
}
