//! Absolute URL construction for the tracker's fixed query-string shapes.

use std::fmt::Display;
use tracing::warn;

/// Tracker used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://travaux.ovh.net/";

/// Category whose feed carries every project's news.
pub const MAIN_CATEGORY: u32 = 0;

/// Named URL templates. Each `{}` is a positional placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlTemplate {
    Categories,
    List,
    Rss,
    Detail,
}

impl UrlTemplate {
    pub fn pattern(self) -> &'static str {
        match self {
            UrlTemplate::Categories => "?project=0&status=all&perpage=1",
            UrlTemplate::List => "?project={}&status=all&pagenum={}",
            UrlTemplate::Rss => "rss.php?proj={}",
            UrlTemplate::Detail => "?do=details&id={}",
        }
    }

    pub fn placeholders(self) -> usize {
        self.pattern().matches("{}").count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: String,
}

impl UrlBuilder {
    /// The base is used as-is apart from gaining a trailing `/` when missing.
    pub fn new(base: &str) -> Self {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Substitute `args` into `template` in order and prepend the base URL.
    ///
    /// Argument count is not enforced: missing arguments substitute as empty
    /// and extra ones are dropped, which yields a malformed but harmless URL.
    pub fn build(&self, template: UrlTemplate, args: &[&dyn Display]) -> String {
        if args.len() != template.placeholders() {
            warn!(
                ?template,
                expected = template.placeholders(),
                got = args.len(),
                "URL template argument count mismatch"
            );
        }

        let mut url = self.base.clone();
        let mut args = args.iter();
        let mut parts = template.pattern().split("{}").peekable();
        while let Some(part) = parts.next() {
            url.push_str(part);
            if parts.peek().is_some() {
                if let Some(arg) = args.next() {
                    url.push_str(&urlencoding::encode(&arg.to_string()));
                }
            }
        }
        url
    }

    pub fn categories(&self) -> String {
        self.build(UrlTemplate::Categories, &[])
    }

    pub fn list(&self, project_id: u32, page: u32) -> String {
        self.build(UrlTemplate::List, &[&project_id, &page])
    }

    pub fn rss(&self, project_id: u32) -> String {
        self.build(UrlTemplate::Rss, &[&project_id])
    }

    pub fn detail(&self, task_id: &str) -> String {
        self.build(UrlTemplate::Detail, &[&task_id])
    }
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
