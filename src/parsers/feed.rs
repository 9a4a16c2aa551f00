//! RSS feed consumer.
//!
//! The feed body arrives as a stream of chunks. It is drained to completion
//! with a single `try_fold`, then decoded as RSS 2.0 in one pass, so the
//! result is produced exactly once no matter how many chunks arrive.

use crate::error::{FetchError, Result, ScrapeError};
use crate::models::NewsItem;
use crate::utils::truncate_for_log;
use futures::{Stream, TryStreamExt};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    guid: Option<Guid>,
}

/// `<guid isPermaLink="…">value</guid>`; only the text is kept.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text", default)]
    value: String,
}

impl From<RssItem> for NewsItem {
    fn from(item: RssItem) -> Self {
        NewsItem {
            title: item.title.map(|t| t.trim().to_string()),
            link: item.link.map(|l| l.trim().to_string()),
            description: item.description,
            pub_date: item.pub_date,
            author: item.author,
            guid: item.guid.map(|g| g.value.trim().to_string()),
        }
    }
}

/// Drain a chunked feed body and decode every item.
///
/// A transport error mid-body surfaces as [`ScrapeError::Fetch`]; a body that
/// is not RSS surfaces as [`ScrapeError::Parse`].
pub async fn collect_feed<S>(chunks: S) -> Result<Vec<NewsItem>>
where
    S: Stream<Item = Result<Vec<u8>, FetchError>>,
{
    let body = chunks
        .try_fold(Vec::new(), |mut body, chunk| async move {
            body.extend_from_slice(&chunk);
            Ok(body)
        })
        .await?;
    debug!(bytes = body.len(), "Feed body drained");
    parse_feed(&body)
}

/// Decode a complete RSS 2.0 document.
pub fn parse_feed(body: &[u8]) -> Result<Vec<NewsItem>> {
    let xml = String::from_utf8_lossy(body);
    let rss: Rss = quick_xml::de::from_str(&xml).map_err(|e| {
        ScrapeError::Parse(format!(
            "feed is not valid RSS ({e}): {}",
            truncate_for_log(&xml, 120)
        ))
    })?;
    Ok(rss.channel.items.into_iter().map(NewsItem::from).collect())
}
