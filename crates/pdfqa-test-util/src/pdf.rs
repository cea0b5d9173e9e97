use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Description of a synthetic PDF for loader tests.
#[derive(Debug, Default)]
pub struct PdfFixture<'a> {
    /// One entry per page; each entry becomes a single line of text.
    pub pages: Vec<&'a str>,
    pub title: Option<&'a str>,
    pub author: Option<&'a str>,
    pub subject: Option<&'a str>,
}

impl<'a> PdfFixture<'a> {
    /// A fixture with the given page texts and no info dictionary fields.
    pub fn pages(pages: &[&'a str]) -> Self {
        Self {
            pages: pages.to_vec(),
            ..Self::default()
        }
    }
}

/// Write a minimal, text-extractable PDF to `path`.
///
/// Uses a standard Type1 font with `WinAnsiEncoding`, so page text must be
/// plain ASCII.
pub fn write_pdf(path: &Path, fixture: &PdfFixture<'_>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in &fixture.pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).expect("page count");
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = lopdf::Dictionary::new();
    for (key, value) in [
        ("Title", fixture.title),
        ("Author", fixture.author),
        ("Subject", fixture.subject),
    ] {
        if let Some(value) = value {
            info.set(key, Object::string_literal(value));
        }
    }
    if !info.is_empty() {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    doc.save(path).expect("save PDF fixture");
}
