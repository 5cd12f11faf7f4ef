//! Turns an article into the chat embed that announces it.

use crate::models::{Article, Embed, EmbedThumbnail};
use chrono::NaiveDate;

/// Accent color for categories outside [`category_color`]'s table.
pub const DEFAULT_COLOR: u32 = 0xedea2b;

/// Thumbnail size the listing uses for teaser images.
const THUMBNAIL_WIDTH: u32 = 520;
const THUMBNAIL_HEIGHT: u32 = 252;

/// Fixed accent color per listing category.
pub fn category_color(category: Option<&str>) -> u32 {
    match category {
        Some("Stravování") => 0xff1d8d, // rose
        Some("Ubytování") => 0x90d5ff,  // light blue
        Some("Obecné") => 0xf2b949,     // mimosa
        Some("Akce") => 0x89f336,       // lime green
        _ => DEFAULT_COLOR,
    }
}

/// RFC 3339 timestamp for midnight UTC of `date`.
///
/// Read back by the date-watermark strategy, so it must parse to the same day.
pub fn embed_timestamp(date: NaiveDate) -> String {
    format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))
}

/// Message body: the excerpt followed by a link to the archived copy.
pub fn description(article: &Article, archived_url: &str) -> String {
    format!("{}\n\n[**Archiv**]({})", article.body_excerpt, archived_url)
}

/// Build the embed announcing `article`.
///
/// The embed links to the article's canonical URL; the archived copy only
/// appears in the description.
pub fn render_embed(article: &Article, archived_url: &str) -> Embed {
    Embed {
        kind: Some("article".to_string()),
        title: Some(article.title.clone()),
        description: Some(description(article, archived_url)),
        url: Some(article.canonical_url.clone()),
        timestamp: article.published_date.map(embed_timestamp),
        color: Some(category_color(article.category.as_deref())),
        thumbnail: article.image_url.as_ref().map(|url| EmbedThumbnail {
            url: url.clone(),
            width: Some(THUMBNAIL_WIDTH),
            height: Some(THUMBNAIL_HEIGHT),
        }),
    }
}
