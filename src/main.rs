//! # Travaux Scraper CLI
//!
//! Runs one scraping operation against the tracker and writes the result as
//! JSON to stdout or to a file.
//!
//! ## Usage
//!
//! ```sh
//! travaux_scraper list --project 5 --all --with-details --pretty
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` (default `info`) to adjust verbosity.

use clap::Parser;
use serde::Serialize;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use travaux_scraper::{ScraperConfig, TaskScraper};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => ScraperConfig::load(path)?,
        None => ScraperConfig::default(),
    };
    args.apply_overrides(&mut config);

    let scraper = TaskScraper::from_config(&config)?;
    info!(base_url = %scraper.urls().base(), "travaux_scraper starting up");

    if let Err(e) = run(&scraper, &args).await {
        error!(error = %e, "Scrape failed");
        let mut source = e.source();
        while let Some(cause) = source {
            error!(cause = %cause, "Caused by");
            source = cause.source();
        }
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    Ok(())
}

async fn run(scraper: &TaskScraper, args: &Cli) -> Result<(), Box<dyn Error>> {
    match &args.command {
        Command::Categories => emit(args, &scraper.list_categories().await?).await,
        Command::List(list) => {
            let listing = scraper.list_pages(list.project, &list.options()).await?;
            emit(args, &listing).await
        }
        Command::Detail { task_id, project } => {
            emit(args, &scraper.fetch_detail(task_id, *project).await?).await
        }
        Command::Feed { project } => emit(args, &scraper.consume_feed(*project).await?).await,
        Command::Newspaper { category } => {
            emit(args, &scraper.build_newspaper(*category).await?).await
        }
    }
}

/// Serialize `value` and write it to the `--output` file or stdout.
#[instrument(level = "info", skip_all, fields(output = ?args.output))]
async fn emit<T: Serialize>(args: &Cli, value: &T) -> Result<(), Box<dyn Error>> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            info!(path = %path.display(), "Wrote JSON output");
        }
        None => println!("{json}"),
    }
    Ok(())
}
