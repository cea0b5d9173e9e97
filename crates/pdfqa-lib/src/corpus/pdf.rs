use std::path::Path;

use anyhow::Context;
use lopdf::{Dictionary, Object};

/// Fields of the PDF document information dictionary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creation_date: String,
    pub mod_date: String,
}

/// Text and info dictionary of a whole PDF.
#[derive(Debug)]
pub struct PdfContents {
    pub info: PdfInfo,
    /// `(page_number, text)` pairs in page order; page numbers are 1-based.
    pub pages: Vec<(u32, String)>,
}

/// Read every page of a PDF.
///
/// Any failure (unparseable file, undecodable page) fails the whole file so
/// the caller never sees a partial document.
pub fn read_pdf(path: &Path) -> anyhow::Result<PdfContents> {
    let doc = lopdf::Document::load(path)
        .with_context(|| format!("Failed to parse PDF {}", path.display()))?;

    let info = info_dictionary(&doc).map(read_info).unwrap_or_default();

    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        let text = doc
            .extract_text(&[page_number])
            .with_context(|| format!("Failed to extract text from page {page_number}"))?;
        pages.push((page_number, text));
    }

    Ok(PdfContents { info, pages })
}

fn info_dictionary(doc: &lopdf::Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    resolve(doc, info)?.as_dict().ok()
}

fn resolve<'a>(doc: &'a lopdf::Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn read_info(dict: &Dictionary) -> PdfInfo {
    let field = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|obj| match obj {
                Object::String(bytes, _) => Some(decode_text_string(bytes)),
                Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .unwrap_or_default()
    };

    PdfInfo {
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creation_date: field(b"CreationDate"),
        mod_date: field(b"ModDate"),
    }
}

/// Decode a PDF text string.
///
/// Handles UTF-16BE and UTF-8 byte order marks; anything else is treated as
/// PDFDocEncoding, which matches Latin-1 for the printable range.
pub fn decode_text_string(bytes: &[u8]) -> String {
    let decoded = if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    };
    decoded.trim_matches(char::from(0)).trim().to_string()
}
