//! Command-line interface definitions for Travaux Scraper.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Connection settings can come from a YAML config file, from flags,
//! or from environment variables; flags win.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use travaux_scraper::{ListOptions, PageErrorPolicy, ScraperConfig};

/// Command-line arguments for the Travaux Scraper application.
///
/// # Examples
///
/// ```sh
/// # Every project on the tracker
/// travaux_scraper categories
///
/// # Pages 1 to 3 of project 5, each row enriched with its detail page
/// travaux_scraper list --project 5 --from 1 --to 3 --with-details
///
/// # Detail records for everything in the main feed, written to a file
/// travaux_scraper --output newspaper.json newspaper
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Tracker base URL
    #[arg(long, env = "TRAVAUX_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long, env = "TRAVAUX_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Retries for transient failures (0 disables)
    #[arg(long, global = true)]
    pub retries: Option<usize>,

    /// Write JSON here instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every project (category) on the tracker
    Categories,
    /// List tasks from the paginated listing
    List(ListArgs),
    /// Fetch the full record of one task
    Detail {
        /// Task id
        task_id: String,
        /// Project id, when known; otherwise read from the page
        #[arg(long, allow_negative_numbers = true)]
        project: Option<i64>,
    },
    /// Dump the RSS feed items of a project
    Feed {
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        project: i64,
    },
    /// Resolve every task in a category's feed to its detail record
    Newspaper {
        #[arg(long, allow_negative_numbers = true)]
        category: Option<i64>,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project id, 0 for every project
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub project: i64,

    /// First page
    #[arg(long)]
    pub from: Option<u32>,

    /// Last page (inclusive)
    #[arg(long, conflicts_with = "all")]
    pub to: Option<u32>,

    /// Continue up to the last page the site reports
    #[arg(long)]
    pub all: bool,

    /// Listing pages fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Enrich each row with its detail page
    #[arg(long)]
    pub with_details: bool,

    /// Keep going when a page fails and report it instead
    #[arg(long)]
    pub keep_going: bool,
}

impl ListArgs {
    pub fn options(&self) -> ListOptions {
        ListOptions {
            from: self.from,
            to: self.to,
            until_last: self.all,
            concurrency: self.concurrency,
            with_details: self.with_details,
            on_page_error: self.keep_going.then_some(PageErrorPolicy::Continue),
        }
    }
}

impl Cli {
    /// Layer flag values over a loaded (or default) configuration.
    pub fn apply_overrides(&self, config: &mut ScraperConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
    }
}
