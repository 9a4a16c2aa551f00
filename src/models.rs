//! Data models for scraped task records.
//!
//! This module defines the records produced by the parsers:
//! - [`Category`]: one selectable project on the tracker
//! - [`TaskSummary`]: one row of a listing page, optionally detail-enriched
//! - [`TaskDetail`]: the full record read from a task's detail page
//! - [`Comment`]: one comment attached to a task
//! - [`NewsItem`]: one entry of the RSS feed
//! - [`PageResult`] and [`Listing`]: results of one page and of a page range
//!
//! Records serialize with camelCase field names, matching the JSON shape
//! consumers of the tracker data already expect.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Author recorded when a comment header does not follow the expected pattern.
pub const UNKNOWN_AUTHOR: &str = "N/C";

/// A project the tracker lets you filter on.
///
/// Id `"0"` means "no selection" and is never produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// One row of a task listing page.
///
/// The enrichment fields (`progress`, `details`, `comments`) stay `None`
/// until [`TaskSummary::enrich`] merges a [`TaskDetail`] into the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub project: String,
    pub category: String,
    pub summary: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastedit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl TaskSummary {
    /// Merge detail-page data into this row.
    ///
    /// `project`, `progress`, `details` and `comments` are taken from the
    /// detail record. `project_id` is only replaced when the detail page
    /// discovered one. Every other field keeps its listing value.
    pub fn enrich(&mut self, detail: TaskDetail) {
        self.project = detail.project;
        self.progress = detail.progress;
        self.details = Some(detail.details);
        self.comments = Some(detail.comments);
        if detail.project_id.is_some() {
            self.project_id = detail.project_id;
        }
    }
}

/// The full record of one task, read from its detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub category: String,
    pub status: String,
    /// Only read from the progress widget; `None` when the widget is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub details: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// [`UNKNOWN_AUTHOR`] when the header could not be split.
    pub author: String,
    /// Local site time. `None` when the header date could not be read.
    pub date: Option<NaiveDateTime>,
    pub text: String,
}

/// One RSS entry. Only `link` is needed downstream; the rest is carried as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    pub author: Option<String>,
    pub guid: Option<String>,
}

/// Rows of one listing page plus the total page count the site reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub tasks: Vec<TaskSummary>,
    /// Always at least 1.
    pub pagecount: u32,
}

/// A page that failed while listing under the continue-on-error policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: u32,
    pub error: String,
}

/// Merged result of a page range, in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub tasks: Vec<TaskSummary>,
    /// Highest page count reported by any fetched page.
    pub page_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<PageFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TaskSummary {
        TaskSummary {
            id: "1234".to_string(),
            task_type: "Incident".to_string(),
            project: "Listing project".to_string(),
            category: "Network".to_string(),
            summary: "Packet loss on rbx".to_string(),
            status: "In progress".to_string(),
            opened: Some("Today".to_string()),
            lastedit: None,
            project_id: Some("5".to_string()),
            ..Default::default()
        }
    }

    fn detail() -> TaskDetail {
        TaskDetail {
            id: "1234".to_string(),
            title: "FS#1234 : Packet loss on rbx".to_string(),
            task_type: "Incident".to_string(),
            category: "Routers".to_string(),
            status: "Closed".to_string(),
            progress: Some("100% completed".to_string()),
            project: "Network".to_string(),
            project_id: None,
            details: "Faulty linecard replaced.".to_string(),
            comments: vec![],
        }
    }

    #[test]
    fn test_enrich_keeps_listing_fields() {
        let mut row = summary();
        row.enrich(detail());

        assert_eq!(row.id, "1234");
        assert_eq!(row.task_type, "Incident");
        assert_eq!(row.category, "Network");
        assert_eq!(row.summary, "Packet loss on rbx");
        assert_eq!(row.status, "In progress");
        assert_eq!(row.opened.as_deref(), Some("Today"));
        assert_eq!(row.project_id.as_deref(), Some("5"));

        assert_eq!(row.project, "Network");
        assert_eq!(row.progress.as_deref(), Some("100% completed"));
        assert_eq!(row.details.as_deref(), Some("Faulty linecard replaced."));
        assert_eq!(row.comments, Some(vec![]));
    }

    #[test]
    fn test_enrich_takes_discovered_project_id() {
        let mut row = summary();
        row.project_id = None;
        let mut d = detail();
        d.project_id = Some("12".to_string());
        row.enrich(d);
        assert_eq!(row.project_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_summary_serialization_shape() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(json["type"], "Incident");
        assert_eq!(json["projectId"], "5");
        assert!(json.get("lastedit").is_none());
        assert!(json.get("comments").is_none());
    }

    #[test]
    fn test_comment_without_date_serializes_null() {
        let c = Comment {
            author: UNKNOWN_AUTHOR.to_string(),
            date: None,
            text: "hello".to_string(),
        };
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains(r#""author":"N/C""#));
        assert!(json.contains(r#""date":null"#));
    }
}
