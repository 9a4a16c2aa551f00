//! Document parsers for the tracker's pages and feed.
//!
//! Each parser turns one raw document into records. None of them touch the
//! network; [`crate::tracker::TaskScraper`] fetches and hands them bodies.
//!
//! # Parsers
//!
//! | Document | Module | Input | Output |
//! |----------|--------|-------|--------|
//! | Category selector | [`categories`] | HTML | `Vec<Category>` |
//! | Task listing page | [`list`] | HTML | `PageResult` |
//! | Task detail page | [`detail`] | HTML | `TaskDetail` |
//! | Recent changes | [`feed`] | RSS 2.0 byte stream | `Vec<NewsItem>` |
//!
//! # Missing data
//!
//! A field that is present but empty degrades to `None` or a sentinel.
//! Only a missing structural anchor (the page is not what we asked for)
//! raises [`crate::error::ScrapeError::Parse`].

pub mod categories;
pub mod detail;
pub mod feed;
pub mod list;
