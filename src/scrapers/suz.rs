//! SUZ CVUT (student housing and catering administration) news scraper.
//!
//! The listing at `https://<domain>/cz/aktuality` renders each article as a
//! card link:
//!
//! ```html
//! <div class="news-list-block"><div>
//!   <div class="cell"><a href="/cz/aktuality/slug">
//!     <div class="img-wrapper"><img src="/files/teaser.jpg"></div>
//!     <div class="labels-container">12. 3. 2024 Akce</div>
//!     <h2>Title</h2>
//!     <div class="body-wrapper"><p>Teaser text</p></div>
//!   </a></div>
//! </div></div>
//! ```
//!
//! Article detail pages keep their content under
//! `.block-suzcvut-content .body`; links found there are what the archiver
//! preserves alongside the article itself.

use crate::error::{Error, Result};
use crate::models::Article;
use crate::scrapers::ListingSource;
use crate::utils::collapse_whitespace;
use chrono::NaiveDate;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Path of the news listing relative to the site root.
pub const LISTING_PATH: &str = "/cz/aktuality";

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-list-block div .cell a").expect("static selector"));
static IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".img-wrapper img").expect("static selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("static selector"));
static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".body-wrapper p").expect("static selector"));
static LABELS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".labels-container").expect("static selector"));
static CONTENT_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".block-suzcvut-content .body a[href]").expect("static selector")
});

/// Czech day-first dates such as `2. 3. 2024` or `02.03.2024`.
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\.\s*(\d{1,2})\.\s*(\d{4})").expect("static regex"));

/// Scraper for the SUZ news listing.
#[derive(Debug, Clone)]
pub struct SuzScraper {
    client: reqwest::Client,
    base: Url,
}

impl SuzScraper {
    /// Create a scraper for `https://<domain>`.
    pub fn new(client: reqwest::Client, domain: &str) -> Result<Self> {
        let base = site_base(domain)?;
        Ok(Self { client, base })
    }

    /// Absolute URL of the news listing.
    pub fn listing_url(&self) -> String {
        listing_url(&self.base)
    }

    async fn fetch_listing(&self) -> Result<String> {
        let html = self
            .client
            .get(self.listing_url())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }
}

impl ListingSource for SuzScraper {
    #[instrument(level = "info", skip_all, fields(listing = %self.listing_url()))]
    async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let html = self
            .fetch_listing()
            .await
            .map_err(|e| Error::Extraction(format!("{}: {e}", self.listing_url())))?;

        let articles = parse_listing(&html, &self.base);
        info!(count = articles.len(), "Indexed SUZ articles");
        Ok(articles)
    }
}

/// Root URL `https://<domain>/` of the site.
pub fn site_base(domain: &str) -> Result<Url> {
    let domain = domain.trim().trim_end_matches('/');
    if domain.is_empty() {
        return Err(Error::Config("source domain is empty".to_string()));
    }
    Ok(Url::parse(&format!("https://{domain}/"))?)
}

/// Absolute listing URL for a site root.
pub fn listing_url(base: &Url) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), LISTING_PATH)
}

/// Parse the listing page into articles, keeping page order.
///
/// Cards without a link or title are skipped. A link that appears twice on
/// the page is kept only once.
pub fn parse_listing(html: &str, base: &Url) -> Vec<Article> {
    let document = Html::parse_document(html);
    let mut skipped = 0usize;

    let parsed: Vec<Article> = document
        .select(&CARD)
        .enumerate()
        .filter_map(|(index, card)| match parse_card(card, base) {
            Some(article) => Some(article),
            None => {
                skipped += 1;
                warn!(index, "Skipping malformed listing entry");
                None
            }
        })
        .collect();

    let total = parsed.len();
    let articles: Vec<Article> = parsed
        .into_iter()
        .unique_by(|a| a.canonical_url.clone())
        .collect();
    if articles.len() != total {
        debug!(dropped = total - articles.len(), "Dropped duplicate links");
    }
    debug!(kept = articles.len(), skipped, "Parsed listing");
    articles
}

fn parse_card(card: ElementRef<'_>, base: &Url) -> Option<Article> {
    let href = card.value().attr("href").map(str::trim).filter(|h| !h.is_empty())?;
    let canonical_url = base.join(href).ok()?.to_string();

    let title = card
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(el.text()))
        .filter(|t| !t.is_empty())?;

    let body_excerpt = collapse_whitespace(card.select(&BODY).flat_map(|el| el.text()));

    let image_url = card
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .and_then(|src| base.join(src).ok())
        .map(|u| u.to_string());

    let label = card
        .select(&LABELS)
        .next()
        .map(|el| collapse_whitespace(el.text()))
        .unwrap_or_default();
    let (published_date, category) = split_label(&label);

    Some(Article {
        image_url,
        title,
        body_excerpt,
        canonical_url,
        category,
        published_date,
    })
}

/// Split a card label into its publish date and category.
///
/// A date that does not exist on the calendar is treated as absent.
pub fn split_label(label: &str) -> (Option<NaiveDate>, Option<String>) {
    let Some(caps) = DATE.captures(label) else {
        let category = label.trim();
        return (None, (!category.is_empty()).then(|| category.to_string()));
    };

    let date = (|| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })();
    if date.is_none() {
        warn!(label, "Unparseable date in label");
    }

    let rest = DATE.replace(label, "");
    let category = collapse_whitespace([&*rest]);
    (date, (!category.is_empty()).then_some(category))
}

/// Every link found in an article page's content block, resolved to an
/// absolute URL.
pub fn article_body_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&CONTENT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("mailto:"))
        .filter_map(|href| base.join(href).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| u.to_string())
        .unique()
        .collect()
}
