//! Text extraction from heterogeneous source documents.
//!
//! Two extractors are provided:
//!
//! - [`pdf_to_text`] — concatenates per-page text from PDF bytes
//! - [`markup_to_text`] — strips HTML/XHTML markup down to normalized lines

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{RagError, Result};

/// Extract plain text from PDF bytes, page by page in document order.
///
/// A page whose extraction yields no text contributes nothing; this is not
/// an error. A valid PDF with no extractable text yields `Ok("")`.
///
/// # Errors
///
/// Returns [`RagError::Extraction`] when the bytes do not decode as a PDF.
/// Batch callers should skip the document and continue with the rest.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| RagError::Extraction {
        format: "pdf".to_string(),
        message: format!("failed to decode PDF: {e}"),
    })?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        // Pages that fail or produce nothing are skipped, matching the
        // per-page tolerance of the extraction contract.
        if let Ok(page_text) = doc.extract_text(&[*page_number]) {
            if !page_text.trim().is_empty() {
                text.push_str(&page_text);
            }
        }
    }

    debug!(pages = doc.get_pages().len(), text_len = text.len(), "extracted PDF text");
    Ok(text)
}

/// Tags whose entire subtree is non-content and must be dropped.
const SKIP_TAGS: &[&str] = &["script", "style", "head", "noscript", "template"];

/// Tags that delimit block-level content; their boundaries become newlines.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "table", "blockquote", "pre", "section", "article",
    "header", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Extract plain text from HTML/XHTML markup.
///
/// Strips all tags, drops `script`/`style` blocks entirely, inserts newline
/// separators at block-level element boundaries, then trims every line and
/// discards lines that become empty. Malformed markup parses permissively,
/// so this never fails; empty input yields an empty string.
pub fn markup_to_text(markup: &str) -> String {
    let html = Html::parse_document(markup);
    let mut raw = String::new();
    walk_element(html.root_element(), &mut raw);

    raw.lines().map(str::trim).filter(|line| !line.is_empty()).collect::<Vec<_>>().join("\n")
}

fn walk_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIP_TAGS.contains(&name) {
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk_element(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&text.text);
        }
    }
    if block {
        out.push('\n');
    }
}
