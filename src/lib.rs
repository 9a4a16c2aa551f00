//! # Travaux Scraper
//!
//! Extracts structured task records from a Flyspray-style ticket tracker
//! (such as `travaux.ovh.net`) that only exposes paginated HTML listings,
//! an HTML detail page per task and an RSS feed of recent changes.
//!
//! ## Architecture
//!
//! The pipeline is layered, leaves first:
//! 1. **URLs** ([`urls`]): absolute URLs from a base and a named template
//! 2. **Parsers** ([`parsers`]): categories, listing pages, detail pages, RSS
//! 3. **Transport** ([`fetch`]): GET with an identifying user agent, timeouts
//!    and retries behind the [`fetch::Fetch`] trait
//! 4. **Scraper** ([`tracker`]): bounded-concurrency pagination, detail
//!    enrichment and the feed-driven newspaper
//!
//! ## Usage
//!
//! ```no_run
//! use travaux_scraper::{ListOptions, ScraperConfig, TaskScraper};
//!
//! # async fn run() -> Result<(), travaux_scraper::ScrapeError> {
//! let scraper = TaskScraper::from_config(&ScraperConfig::default())?;
//! let listing = scraper
//!     .list_pages(0, &ListOptions { from: Some(1), to: Some(3), ..Default::default() })
//!     .await?;
//! println!("{} tasks", listing.tasks.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parsers;
pub mod tracker;
pub mod urls;
pub mod utils;

pub use config::{PageErrorPolicy, ScraperConfig};
pub use error::{FetchError, ScrapeError};
pub use models::{Category, Comment, Listing, NewsItem, PageFailure, PageResult, TaskDetail, TaskSummary};
pub use tracker::{ListOptions, TaskScraper};
