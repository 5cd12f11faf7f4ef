//! Deduplication and ordering of freshly scraped articles.
//!
//! The channel history is the only record of what was already announced.
//! It is reduced to an [`AnnouncedRecord`] whose shape depends on the
//! configured [`Strategy`], and [`decide`] uses it to pick the articles that
//! still need to be posted.
//!
//! The listing shows the newest article first, so the batch is reversed
//! before filtering: a backlog is posted oldest first and the last message
//! in the channel is always the most recent article.

use crate::models::Article;
use chrono::NaiveDate;
use clap::ValueEnum;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// How an article is recognised as already announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Compare canonical article URLs against the URLs found in history.
    #[default]
    Url,
    /// Compare publish dates against the latest announced date.
    Date,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Url => f.write_str("url"),
            Strategy::Date => f.write_str("date"),
        }
    }
}

/// What the channel history says has already been announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnouncedRecord {
    /// Scheme-less identity keys of announced URLs (see [`url_key`]).
    Urls(HashSet<String>),
    /// Latest announced publish day.
    Watermark(NaiveDate),
}

impl AnnouncedRecord {
    /// Build a URL record from canonical URLs.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AnnouncedRecord::Urls(urls.into_iter().map(|u| url_key(u.as_ref()).to_string()).collect())
    }

    /// Whether `article` is already covered by this record.
    pub fn covers(&self, article: &Article) -> bool {
        match self {
            AnnouncedRecord::Urls(keys) => keys.contains(url_key(&article.canonical_url)),
            AnnouncedRecord::Watermark(latest) => match article.published_date {
                Some(date) => date <= *latest,
                None => {
                    warn!(url = %article.canonical_url, "Article has no publish date; cannot compare to watermark");
                    true
                }
            },
        }
    }
}

/// Identity key of a URL: the URL without its `http://` or `https://` scheme.
///
/// Archive-wrapped links in older messages do not always keep the scheme of
/// the original, so identity ignores it.
pub fn url_key(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Choose the articles to publish now, oldest first.
///
/// The batch is reversed before filtering, so the result is in the order
/// the articles were originally published.
///
/// # Arguments
///
/// * `articles` - The extractor's batch in page order (newest first)
/// * `announced` - What the channel history says was already announced
///
/// # Returns
///
/// The articles not covered by `announced`, oldest first. Empty when
/// nothing is new.
///
/// # Examples
///
/// ```ignore
/// // listing [c, b, a], history already has a
/// let record = AnnouncedRecord::from_urls([a.canonical_url.as_str()]);
/// assert_eq!(decide(vec![c.clone(), b.clone(), a], &record), vec![b, c]);
/// ```
pub fn decide(articles: Vec<Article>, announced: &AnnouncedRecord) -> Vec<Article> {
    let total = articles.len();
    let fresh: Vec<Article> = articles
        .into_iter()
        .rev()
        .filter(|article| !announced.covers(article))
        .collect();
    debug!(total, new = fresh.len(), "Deduplicated batch");
    fresh
}
