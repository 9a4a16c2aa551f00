//! Small helpers shared by the parsers and the logging code.
//!
//! - Element text extraction with whitespace trimming
//! - CSS selector compilation for fixed selectors
//! - String truncation for log output

use scraper::{ElementRef, Html, Selector};

/// Compile a selector known at build time.
///
/// Only called with literal selectors from this crate, so a parse failure is
/// a programming error.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

/// Concatenated, trimmed text of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first match of `sel` under `scope`, empty when absent.
pub fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope.select(sel).next().map(element_text).unwrap_or_default()
}

/// Concatenated raw text of every match of `sel` in the document, untrimmed.
pub fn document_text(document: &Html, sel: &Selector) -> String {
    document
        .select(sel)
        .map(|e| e.text().collect::<String>())
        .collect::<String>()
}

/// Whether the document body holds at least one element.
///
/// Used as the structural check for pages that have no stronger anchor:
/// an error page served as plain text or an empty body fails it.
pub fn has_body_content(document: &Html, body_children: &Selector) -> bool {
    document.select(body_children).next().is_some()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
