//! PDF rendering of composed report pages, standalone or after a template.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::layout::{FontStyle, PAGE_HEIGHT, PAGE_WIDTH, Page};
use crate::error::ReportError;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// How many composed pages follow the template's own pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Only the first composed page; overflow pages are dropped.
    #[default]
    FirstPageOnly,
    /// Every composed page.
    AllPages,
}

/// Render pages into a new PDF document.
pub fn render(pages: &[Page]) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids = add_pages(&mut doc, pages_id, pages)?;
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.into_iter().map(Object::from).collect::<Vec<_>>(),
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save(doc)
}

/// Append composed pages after every page of `template`, which is left as-is.
pub fn render_onto_template(
    template: &[u8],
    pages: &[Page],
    mode: MergeMode,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::load_mem(template)?;
    let template_pages = doc.get_pages().len();

    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let pages_id = doc
        .get_dictionary(root_id)?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| ReportError::MissingPageTree)?;

    let appended = match mode {
        MergeMode::FirstPageOnly => &pages[..pages.len().min(1)],
        MergeMode::AllPages => pages,
    };
    let kids = add_pages(&mut doc, pages_id, appended)?;

    let tree = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    let count = tree.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    tree.set("Count", count + kids.len() as i64);
    tree.get_mut(b"Kids")?
        .as_array_mut()?
        .extend(kids.into_iter().map(Object::from));

    debug!(
        template_pages,
        appended = appended.len(),
        dropped = pages.len() - appended.len(),
        "Merged report onto template"
    );
    save(doc)
}

fn save(mut doc: Document) -> Result<Vec<u8>, ReportError> {
    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Add one page object per composed page, parented to `pages_id`.
fn add_pages(
    doc: &mut Document,
    pages_id: ObjectId,
    pages: &[Page],
) -> Result<Vec<ObjectId>, ReportError> {
    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let mut ids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        ids.push(page_id);
    }
    Ok(ids)
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::with_capacity(page.draws.len() * 5);
    for draw in &page.draws {
        let font = match draw.style {
            FontStyle::Regular => REGULAR_FONT,
            FontStyle::Bold => BOLD_FONT,
        };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), draw.size.into()]));
        operations.push(Operation::new("Td", vec![draw.x.into(), draw.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(latin1(&draw.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

/// Encode for the WinAnsi standard fonts; characters past U+00FF become `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::model::Card;
    use crate::report::layout::ReportLayout;

    fn cards(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new(format!("Card {i}"), format!("Detail {i}")))
            .collect()
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn render_emits_pdf_with_one_page_per_layout_page() {
        let pages = ReportLayout::default().compose(&cards(30));
        let bytes = render(&pages).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(page_count(&bytes), 2);
    }

    #[test]
    fn render_contains_card_text() {
        let pages = ReportLayout::default().compose(&[Card::new("Crane", "Idle")]);
        let bytes = render(&pages).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        assert!(content.windows(7).any(|w| w == b"(Crane)"));
        assert!(content.windows(6).any(|w| w == b"(Idle)"));
    }

    #[test]
    fn template_merge_keeps_first_composed_page_only() {
        let template = render(&ReportLayout::new("Skeleton").compose(&cards(30))).unwrap();
        assert_eq!(page_count(&template), 2);

        let report = ReportLayout::default().compose(&cards(60));
        assert_eq!(report.len(), 4);

        let merged = render_onto_template(&template, &report, MergeMode::FirstPageOnly).unwrap();
        assert_eq!(page_count(&merged), 3);
    }

    #[test]
    fn template_merge_all_pages_appends_everything() {
        let template = render(&ReportLayout::new("Skeleton").compose(&[])).unwrap();
        let report = ReportLayout::default().compose(&cards(60));

        let merged = render_onto_template(&template, &report, MergeMode::AllPages).unwrap();
        assert_eq!(page_count(&merged), 1 + report.len());
    }

    #[test]
    fn invalid_template_is_an_error() {
        let pages = ReportLayout::default().compose(&[]);
        assert!(render_onto_template(b"not a pdf", &pages, MergeMode::default()).is_err());
    }

    #[test]
    fn write_failures_are_report_errors() {
        let err: ReportError = std::io::Error::other("disk full").into();
        assert!(matches!(err, ReportError::Io(_)));
        assert_eq!(err.to_string(), "Failed to write PDF: disk full");
    }

    #[test]
    fn latin1_replaces_wide_characters() {
        assert_eq!(latin1("Béton"), b"B\xe9ton".to_vec());
        assert_eq!(latin1("→ ok"), b"? ok".to_vec());
    }
}
