//! Tracker client: the public operations over the tracker.
//!
//! [`TaskScraper`] ties the URL builder, a [`Fetch`] implementation and the
//! parsers together:
//!
//! 1. **Categories**: [`TaskScraper::list_categories`]
//! 2. **Listing**: [`TaskScraper::fetch_list_page`] for one page,
//!    [`TaskScraper::list_pages`] for a range with a bounded worker pool
//! 3. **Details**: [`TaskScraper::fetch_detail`], also used to enrich rows
//! 4. **Feed**: [`TaskScraper::consume_feed`] and
//!    [`TaskScraper::build_newspaper`], which resolves every feed entry to
//!    its detail record
//!
//! Concurrent fetches share nothing but `&self`. Results are re-assembled in
//! page order and row order regardless of completion order.

use crate::config::{PageErrorPolicy, ScraperConfig};
use crate::error::{Result, ScrapeError};
use crate::fetch::{Fetch, HttpFetcher, RetryFetch};
use crate::models::{Category, Listing, NewsItem, PageFailure, PageResult, TaskDetail};
use crate::parsers::{categories, detail, feed, list};
use crate::urls::{MAIN_CATEGORY, UrlBuilder};
use futures::stream::{self, StreamExt, TryStreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::pin::pin;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

static FEED_TASK_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"id=(\d+)").expect("valid regex"));

/// Options for [`TaskScraper::list_pages`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// First page, 1 when unset or 0.
    pub from: Option<u32>,
    /// Last page (inclusive); `from` when unset or lower than `from`.
    pub to: Option<u32>,
    /// Ignore `to` and continue up to the page count the first page reports.
    pub until_last: bool,
    /// Pages fetched at once; the scraper's configured value when unset.
    pub concurrency: Option<usize>,
    /// Enrich every row with its detail page.
    pub with_details: bool,
    /// Overrides the configured page error policy.
    pub on_page_error: Option<PageErrorPolicy>,
}

/// Client for one tracker instance.
///
/// Generic over the [`Fetch`] transport so tests can serve canned pages; the
/// default is HTTP with retries. Detail fetches from every concurrent
/// operation on one scraper share a single pool of `detail_concurrency`
/// permits.
pub struct TaskScraper<F = RetryFetch<HttpFetcher>> {
    fetcher: F,
    urls: UrlBuilder,
    page_concurrency: usize,
    detail_concurrency: usize,
    detail_permits: Semaphore,
    page_error_policy: PageErrorPolicy,
}

impl TaskScraper {
    /// Build a scraper over HTTP with the configured timeouts and retries.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpFetcher::new(config)
            .map_err(|e| ScrapeError::Config(format!("cannot build HTTP client: {e}")))?;
        let fetcher = RetryFetch::new(
            http,
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        );
        Ok(Self::with_fetcher(fetcher, config))
    }
}

impl<F: Fetch> TaskScraper<F> {
    /// Build a scraper over any transport.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Transport every request goes through
    /// * `config` - Base URL, concurrency limits and page error policy; the
    ///   transport settings are ignored
    pub fn with_fetcher(fetcher: F, config: &ScraperConfig) -> Self {
        let detail_concurrency = config.detail_concurrency.max(1);
        Self {
            fetcher,
            urls: UrlBuilder::new(&config.base_url),
            page_concurrency: config.page_concurrency.max(1),
            detail_concurrency,
            detail_permits: Semaphore::new(detail_concurrency),
            page_error_policy: config.page_error_policy,
        }
    }

    /// URL builder for the configured base.
    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// Every selectable project, without the "no selection" entry.
    #[instrument(level = "info", skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let html = self.fetcher.fetch(&self.urls.categories()).await?;
        let found = categories::parse_categories(&html)?;
        info!(count = found.len(), "Listed categories");
        Ok(found)
    }

    /// One listing page, optionally with every row detail-enriched.
    ///
    /// Page 0 is read as page 1.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_list_page(
        &self,
        project_id: i64,
        page: u32,
        with_details: bool,
    ) -> Result<PageResult> {
        let project_id = validate_project_id(project_id)?;
        self.fetch_page(project_id, page.max(1), with_details).await
    }

    /// Fetch pages `from..=to` with at most `concurrency` requests in flight
    /// and merge their rows in page order.
    ///
    /// Under [`PageErrorPolicy::FailFast`] the first failing page in page
    /// order fails the call with [`ScrapeError::Page`]. Under
    /// [`PageErrorPolicy::Continue`] failures are logged and listed in
    /// [`Listing::failed_pages`]. With `until_last`, a failure of the first
    /// page always fails the call since the range is unknown.
    #[instrument(level = "info", skip(self))]
    pub async fn list_pages(&self, project_id: i64, options: &ListOptions) -> Result<Listing> {
        let project_id = validate_project_id(project_id)?;
        let from = options.from.filter(|from| *from > 0).unwrap_or(1);
        let concurrency = options.concurrency.unwrap_or(self.page_concurrency).max(1);
        let policy = options.on_page_error.unwrap_or(self.page_error_policy);
        let with_details = options.with_details;
        let t0 = Instant::now();

        let mut listing = Listing::default();
        let (remaining, to) = if options.until_last {
            let first = self
                .fetch_page(project_id, from, with_details)
                .await
                .map_err(|e| e.in_page(from))?;
            let to = first.pagecount.max(from);
            listing.page_count = first.pagecount;
            listing.tasks.extend(first.tasks);
            // Empty when the first page was already the last addressable one.
            (from.checked_add(1).map(|next| next..=to), to)
        } else {
            let to = options.to.filter(|to| *to >= from).unwrap_or(from);
            (Some(from..=to), to)
        };
        info!(project_id, from, to, concurrency, ?policy, "Listing pages");

        let mut pages = pin!(
            stream::iter(remaining.into_iter().flatten())
                .map(|page| async move { (page, self.fetch_page(project_id, page, with_details).await) })
                .buffered(concurrency)
        );

        while let Some((page, outcome)) = pages.next().await {
            match outcome {
                Ok(result) => {
                    debug!(page, rows = result.tasks.len(), "Merged page");
                    listing.page_count = listing.page_count.max(result.pagecount);
                    listing.tasks.extend(result.tasks);
                }
                Err(e) => match policy {
                    PageErrorPolicy::FailFast => return Err(e.in_page(page)),
                    PageErrorPolicy::Continue => {
                        warn!(page, error = %e, "Page failed; continuing with remaining pages");
                        listing.failed_pages.push(PageFailure {
                            page,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            tasks = listing.tasks.len(),
            failed = listing.failed_pages.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Listed pages"
        );
        Ok(listing)
    }

    /// Full record of one task.
    ///
    /// With `project_id` unset or 0 the project id is read from the page.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_detail(&self, task_id: &str, project_id: Option<i64>) -> Result<TaskDetail> {
        let project_id = validate_project_id(project_id.unwrap_or(0))?;
        self.detail(task_id, project_id).await
    }

    /// Every item of the project's RSS feed.
    #[instrument(level = "info", skip(self))]
    pub async fn consume_feed(&self, project_id: i64) -> Result<Vec<NewsItem>> {
        let project_id = validate_project_id(project_id)?;
        let chunks = self.fetcher.fetch_stream(&self.urls.rss(project_id)).await?;
        let items = feed::collect_feed(chunks).await?;
        info!(count = items.len(), "Consumed feed");
        Ok(items)
    }

    /// Resolve every task mentioned in a category's feed to its detail record.
    ///
    /// Ids are de-duplicated keeping feed order. Items whose link carries no
    /// task id are skipped. The first failing detail fails the report with
    /// [`ScrapeError::Task`].
    #[instrument(level = "info", skip(self))]
    pub async fn build_newspaper(&self, category: Option<i64>) -> Result<Vec<TaskDetail>> {
        let category = category.unwrap_or(i64::from(MAIN_CATEGORY));
        let news = self.consume_feed(category).await?;

        let ids: Vec<String> = news
            .iter()
            .filter_map(|item| {
                let id = item.link.as_deref().and_then(task_id_from_link);
                if id.is_none() {
                    warn!(link = ?item.link, title = ?item.title, "Feed item does not reference a task");
                }
                id
            })
            .unique()
            .collect();
        info!(items = news.len(), tasks = ids.len(), "Resolving feed tasks");

        let details: Vec<TaskDetail> = stream::iter(ids)
            .map(|id| async move {
                let outcome = self.detail(&id, 0).await;
                outcome.map_err(|e| e.in_task(id))
            })
            .buffered(self.detail_concurrency)
            .try_collect()
            .await?;

        info!(count = details.len(), "Built newspaper");
        Ok(details)
    }

    async fn fetch_page(&self, project_id: u32, page: u32, with_details: bool) -> Result<PageResult> {
        let html = self.fetcher.fetch(&self.urls.list(project_id, page)).await?;
        let mut result = list::parse_list_page(&html, project_id)?;
        debug!(page, rows = result.tasks.len(), pagecount = result.pagecount, "Parsed listing page");

        if with_details {
            result.tasks = stream::iter(result.tasks)
                .map(|mut task| async move {
                    let outcome = self.detail(&task.id, project_id).await;
                    match outcome {
                        Ok(found) => {
                            task.enrich(found);
                            Ok(task)
                        }
                        Err(e) => Err(e.in_task(task.id)),
                    }
                })
                .buffered(self.detail_concurrency)
                .try_collect()
                .await?;
        }
        Ok(result)
    }

    async fn detail(&self, task_id: &str, project_id: u32) -> Result<TaskDetail> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(ScrapeError::InvalidArgument("task id must not be empty".to_string()));
        }
        let html = {
            let _permit = self.detail_permits.acquire().await.map_err(|_| {
                ScrapeError::Config("detail fetch pool is closed".to_string())
            })?;
            self.fetcher.fetch(&self.urls.detail(task_id)).await?
        };
        detail::parse_detail_page(&html, task_id, project_id)
    }
}

/// Accept 0 ("all projects") and positive ids that fit the tracker's range.
pub fn validate_project_id(project_id: i64) -> Result<u32> {
    u32::try_from(project_id).map_err(|_| {
        ScrapeError::InvalidArgument(format!("project id must be a non-negative integer, got {project_id}"))
    })
}

/// Task id referenced by a feed link (`…?do=details&id=123`).
pub fn task_id_from_link(link: &str) -> Option<String> {
    FEED_TASK_ID.captures(link).map(|caps| caps[1].to_string())
}
