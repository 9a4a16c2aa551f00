//! Task listing page parser.
//!
//! Rows are `<tr id="task…">` elements with one cell per column, each cell
//! carrying a `task_<column>` class. The pager text (`#numbers`) reads
//! "Page 1 of 12"; single-page results omit it.

use crate::error::{Result, ScrapeError};
use crate::models::{PageResult, TaskSummary};
use crate::utils::{document_text, first_text, has_body_content, selector};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

static BODY_CHILDREN: Lazy<Selector> = Lazy::new(|| selector("body > *"));
static ROW: Lazy<Selector> = Lazy::new(|| selector("tr[id^=\"task\"]"));
static PAGER: Lazy<Selector> = Lazy::new(|| selector("#numbers"));
static PAGE_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"of\s(\d+)").expect("valid regex"));

static ID: Lazy<Selector> = Lazy::new(|| selector(".task_id"));
static TYPE: Lazy<Selector> = Lazy::new(|| selector(".task_tasktype"));
static PROJECT: Lazy<Selector> = Lazy::new(|| selector(".task_project"));
static CATEGORY: Lazy<Selector> = Lazy::new(|| selector(".task_category"));
static SUMMARY: Lazy<Selector> = Lazy::new(|| selector(".task_summary > a"));
static STATUS: Lazy<Selector> = Lazy::new(|| selector(".task_status"));
static OPENED: Lazy<Selector> = Lazy::new(|| selector(".task_dateopened"));
static LASTEDIT: Lazy<Selector> = Lazy::new(|| selector(".task_lastedit"));

/// Parse one listing page.
///
/// `project_id` is stamped on every row when positive. Rows whose id cell
/// is missing or blank are skipped.
pub fn parse_list_page(html: &str, project_id: u32) -> Result<PageResult> {
    let document = Html::parse_document(html);
    if !has_body_content(&document, &BODY_CHILDREN) {
        return Err(ScrapeError::Parse("listing page has an empty body".to_string()));
    }

    let pagecount = page_count(&document_text(&document, &PAGER));

    let mut tasks = Vec::new();
    for row in document.select(&ROW) {
        let id = first_text(row, &ID);
        if id.is_empty() {
            debug!(row_id = row.value().id().unwrap_or_default(), "Skipping listing row without a task id");
            continue;
        }

        tasks.push(TaskSummary {
            id,
            task_type: first_text(row, &TYPE),
            project: first_text(row, &PROJECT),
            category: first_text(row, &CATEGORY),
            summary: first_text(row, &SUMMARY),
            status: first_text(row, &STATUS),
            opened: non_blank(first_text(row, &OPENED)),
            lastedit: non_blank(first_text(row, &LASTEDIT)),
            project_id: (project_id > 0).then(|| project_id.to_string()),
            ..Default::default()
        });
    }

    Ok(PageResult { tasks, pagecount })
}

/// Total pages announced by the pager text; 1 when absent or unreadable.
pub fn page_count(pager_text: &str) -> u32 {
    PAGE_COUNT
        .captures(pager_text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|count| *count >= 1)
        .unwrap_or(1)
}

fn non_blank(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
      <div id="numbers">Page 2 of 14 <a href="?pagenum=3">Next</a></div>
      <table id="tasklist_table">
        <thead><tr><th>ID</th></tr></thead>
        <tr id="task10421">
          <td class="task_id"><a href="?do=details&id=10421">10421</a></td>
          <td class="task_tasktype">Incident</td>
          <td class="task_project">Network</td>
          <td class="task_category">Backbone</td>
          <td class="task_summary"><a href="?do=details&id=10421">Packet loss rbx-g1</a></td>
          <td class="task_status">In progress</td>
          <td class="task_dateopened">Monday, 04 March 2019</td>
          <td class="task_lastedit"> </td>
        </tr>
        <tr id="task10420">
          <td class="task_id">10420</td>
          <td class="task_tasktype">Maintenance</td>
          <td class="task_project">Network</td>
          <td class="task_category">Routers</td>
          <td class="task_summary"><a>Reboot gra-1</a></td>
          <td class="task_status">Closed</td>
        </tr>
        <tr id="taskfooter"><td class="task_id">  </td></tr>
        <tr id="other"><td class="task_id">999</td></tr>
      </table>
    </body></html>"#;

    #[test]
    fn test_parses_rows_in_document_order() {
        let result = parse_list_page(PAGE, 5).unwrap();
        assert_eq!(result.pagecount, 14);
        assert_eq!(result.tasks.len(), 2);

        let first = &result.tasks[0];
        assert_eq!(first.id, "10421");
        assert_eq!(first.task_type, "Incident");
        assert_eq!(first.project, "Network");
        assert_eq!(first.category, "Backbone");
        assert_eq!(first.summary, "Packet loss rbx-g1");
        assert_eq!(first.status, "In progress");
        assert_eq!(first.opened.as_deref(), Some("Monday, 04 March 2019"));
        assert_eq!(first.lastedit, None);
        assert_eq!(first.project_id.as_deref(), Some("5"));

        let second = &result.tasks[1];
        assert_eq!(second.id, "10420");
        assert_eq!(second.opened, None);
        assert_eq!(second.lastedit, None);
    }

    #[test]
    fn test_every_row_has_an_id() {
        let result = parse_list_page(PAGE, 0).unwrap();
        assert!(result.tasks.iter().all(|t| !t.id.is_empty()));
    }

    #[test]
    fn test_project_zero_leaves_project_id_unset() {
        let result = parse_list_page(PAGE, 0).unwrap();
        assert!(result.tasks.iter().all(|t| t.project_id.is_none()));
    }

    #[test]
    fn test_missing_pager_defaults_to_one() {
        let html = "<html><body><table></table></body></html>";
        let result = parse_list_page(html, 1).unwrap();
        assert_eq!(result.pagecount, 1);
        assert!(result.tasks.is_empty());
    }

    #[test]
    fn test_page_count_edge_cases() {
        assert_eq!(page_count("Page 1 of 3"), 3);
        assert_eq!(page_count("of 0"), 1);
        assert_eq!(page_count("Page 1"), 1);
        assert_eq!(page_count("of 99999999999999"), 1);
        assert_eq!(page_count(""), 1);
    }

    #[test]
    fn test_empty_body_is_parse_error() {
        assert!(matches!(
            parse_list_page("Bad gateway", 1),
            Err(ScrapeError::Parse(_))
        ));
    }
}
