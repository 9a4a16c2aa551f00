//! Error types for the scraping pipeline.
//!
//! Failures fall into three families:
//! - [`ScrapeError::InvalidArgument`]: rejected before any request is sent
//! - [`ScrapeError::Fetch`]: transport failure or non-2xx status
//! - [`ScrapeError::Parse`]: a structural anchor is missing from a document
//!
//! A field that is present but empty is not an error; parsers degrade it to
//! `None` or a sentinel instead. Errors raised while walking a page range or
//! a set of tasks are wrapped in [`ScrapeError::Page`] / [`ScrapeError::Task`]
//! so the caller knows exactly what to retry.

use thiserror::Error;

/// Outbound request failure.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// The URL the failing request was sent to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. } | FetchError::Status { url, .. } => url,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<ScrapeError>,
    },
    #[error("task {task_id}: {source}")]
    Task {
        task_id: String,
        #[source]
        source: Box<ScrapeError>,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Attach the page number that produced this error.
    pub fn in_page(self, page: u32) -> Self {
        ScrapeError::Page {
            page,
            source: Box::new(self),
        }
    }

    /// Attach the task id that produced this error.
    pub fn in_task(self, task_id: impl Into<String>) -> Self {
        ScrapeError::Task {
            task_id: task_id.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
