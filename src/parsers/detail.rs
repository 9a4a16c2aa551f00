//! Task detail page parser.
//!
//! Two regions are read independently:
//! - `#taskdetails`: title, breadcrumb (`#fineprint`) and progress widget
//! - `#taskfields1`: type, category and status cells
//!
//! Comments are `<em>` headers under `#comments`, each followed by the
//! element holding the comment body.

use crate::error::{Result, ScrapeError};
use crate::models::{Comment, TaskDetail, UNKNOWN_AUTHOR};
use crate::utils::{element_text, first_text, selector};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static DETAILS: Lazy<Selector> = Lazy::new(|| selector("#taskdetails"));
static FIELDS: Lazy<Selector> = Lazy::new(|| selector("#taskfields1"));
static FULL_TEXT: Lazy<Selector> = Lazy::new(|| selector("#taskdetailsfull"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h2"));
static BREADCRUMB: Lazy<Selector> = Lazy::new(|| selector("#fineprint > a"));
static PROJECT_LINK: Lazy<Selector> = Lazy::new(|| selector("#fineprint a"));
static PROGRESS: Lazy<Selector> = Lazy::new(|| selector("#percent > img"));
static TYPE: Lazy<Selector> = Lazy::new(|| selector("#tasktype"));
static CATEGORY: Lazy<Selector> = Lazy::new(|| selector("#category"));
static STATUS: Lazy<Selector> = Lazy::new(|| selector("#status"));
static COMMENT_HEADER: Lazy<Selector> = Lazy::new(|| selector("#comments > em"));

static PROJECT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"project=(\d+)").expect("valid regex"));
static MERIDIEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[AP]M\s*$").expect("valid regex"));

/// Parse one task detail page.
///
/// When `project_id_hint` is 0 the project id is looked up in the breadcrumb
/// link; otherwise the caller already knows it and `project_id` stays `None`.
pub fn parse_detail_page(html: &str, task_id: &str, project_id_hint: u32) -> Result<TaskDetail> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(ScrapeError::InvalidArgument("task id must not be empty".to_string()));
    }

    let document = Html::parse_document(html);
    let details = document
        .select(&DETAILS)
        .next()
        .ok_or_else(|| ScrapeError::Parse("detail page has no #taskdetails region".to_string()))?;
    let fields = document
        .select(&FIELDS)
        .next()
        .ok_or_else(|| ScrapeError::Parse("detail page has no #taskfields1 region".to_string()))?;

    let project_link = details.select(&PROJECT_LINK).next();
    let project_id = if project_id_hint == 0 {
        project_link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| PROJECT_ID.captures(href))
            .map(|caps| caps[1].to_string())
    } else {
        None
    };

    let category = match first_text(fields, &CATEGORY) {
        c if c.is_empty() => first_text(details, &BREADCRUMB),
        c => c,
    };

    Ok(TaskDetail {
        id: task_id.to_string(),
        title: first_text(details, &TITLE),
        task_type: first_text(fields, &TYPE),
        category,
        status: first_text(fields, &STATUS),
        progress: details
            .select(&PROGRESS)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map(|alt| alt.trim().to_string()),
        project: project_link.map(element_text).unwrap_or_default(),
        project_id,
        details: document
            .select(&FULL_TEXT)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        comments: document.select(&COMMENT_HEADER).map(parse_comment).collect(),
    })
}

fn parse_comment(header: ElementRef<'_>) -> Comment {
    let (author, date) = parse_comment_header(&element_text(header));
    let text = header
        .next_siblings()
        .find_map(ElementRef::wrap)
        .map(element_text)
        .unwrap_or_default();
    Comment { author, date, text }
}

/// Split `Comment by <author> - <weekday>, <day> <month> <year>, <HH:MM>[AM|PM]`.
///
/// Without a `-` separator the author is [`UNKNOWN_AUTHOR`] and the date is
/// `None`. A separator with an unreadable date keeps the author.
pub fn parse_comment_header(header: &str) -> (String, Option<NaiveDateTime>) {
    let split = header
        .rsplit_once(" - ")
        .or_else(|| header.split_once('-'));
    match split {
        Some((author, date)) => {
            let author = author.replace("Comment by", "").trim().to_string();
            (author, parse_comment_date(date))
        }
        None => (UNKNOWN_AUTHOR.to_string(), None),
    }
}

/// Read `<weekday>, <day> <month> <year>, <HH:MM>[AM|PM]`.
///
/// The site prints a 24-hour clock followed by a meridiem marker
/// ("14:21PM"), so the marker is dropped rather than applied.
pub fn parse_comment_date(text: &str) -> Option<NaiveDateTime> {
    let mut parts = text.split(',').map(str::trim);
    let _weekday = parts.next()?;
    let day = parts.next()?;
    let time = parts.next()?;

    let date = NaiveDate::parse_from_str(day, "%d %B %Y").ok()?;
    let time = NaiveTime::parse_from_str(&MERIDIEM.replace(time, ""), "%H:%M").ok()?;
    Some(date.and_time(time))
}
