//! Category selector parser.
//!
//! The tracker renders one `.projectsmenupos` block per project, each holding
//! a hidden `project` input with the id and a `.mainbutton` control with the
//! label.

use crate::error::{Result, ScrapeError};
use crate::models::Category;
use crate::utils::{element_text, has_body_content, selector};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static BODY_CHILDREN: Lazy<Selector> = Lazy::new(|| selector("body > *"));
static PROJECT_ENTRY: Lazy<Selector> = Lazy::new(|| selector(".projectsmenupos"));
static PROJECT_INPUT: Lazy<Selector> = Lazy::new(|| selector("input[name=\"project\"]"));
static PROJECT_LABEL: Lazy<Selector> = Lazy::new(|| selector(".mainbutton"));

/// Parse the category selection page.
///
/// Entries without an id, or with the `"0"` "no selection" id, are skipped.
/// A page with no entries at all is a valid empty result.
pub fn parse_categories(html: &str) -> Result<Vec<Category>> {
    let document = Html::parse_document(html);
    if !has_body_content(&document, &BODY_CHILDREN) {
        return Err(ScrapeError::Parse(
            "category page has an empty body".to_string(),
        ));
    }

    let mut categories = Vec::new();
    for entry in document.select(&PROJECT_ENTRY) {
        let id = entry
            .select(&PROJECT_INPUT)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(str::trim)
            .unwrap_or_default();
        if id.is_empty() || id == "0" {
            debug!(id, "Skipping category entry without a usable id");
            continue;
        }

        let name = entry
            .select(&PROJECT_LABEL)
            .next()
            .map(|label| match label.value().attr("value") {
                Some(value) => value.trim().to_string(),
                None => element_text(label),
            })
            .unwrap_or_default();

        categories.push(Category {
            id: id.to_string(),
            name,
        });
    }
    Ok(categories)
}
