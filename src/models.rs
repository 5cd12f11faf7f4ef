//! Data models shared by the pipeline stages.
//!
//! - [`Article`]: one entry scraped from the news listing
//! - [`ArchivedArticle`]: an article paired with the outcome of archiving it
//! - [`ChatMessage`], [`MessageAuthor`], [`Embed`]: the slice of the chat
//!   platform's message model the pipeline reads and writes
//!
//! The chat types mirror the Discord JSON shapes so they can be
//! (de)serialized directly from API responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A news entry as scraped from the listing page.
///
/// Created fresh on every poll cycle. The `canonical_url` is the identity
/// key and is unique within one extraction batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Absolute URL of the teaser image, if the entry has one.
    pub image_url: Option<String>,
    pub title: String,
    /// Teaser paragraph shown on the listing page.
    pub body_excerpt: String,
    /// The article's own link on the source site.
    pub canonical_url: String,
    /// Label such as "Akce" or "Stravování".
    pub category: Option<String>,
    /// Day of publication; the listing never carries a time of day.
    pub published_date: Option<NaiveDate>,
}

/// Result of submitting an article to the archival service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Reference URL of the archived copy.
    Archived(String),
    /// Archival failed; the article must not be announced this cycle.
    Failed(String),
}

/// An article together with its archival outcome, used to build the message.
#[derive(Debug, Clone)]
pub struct ArchivedArticle {
    pub article: Article,
    pub archive: ArchiveOutcome,
}

/// Identifier of a message posted to the chat channel.
pub type MessageId = String;

/// A message read back from the channel history.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub author: MessageAuthor,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageAuthor {
    /// Account snowflake; announcements are recognised by this.
    pub id: String,
    pub username: String,
    /// Absent for regular users in the Discord payload.
    #[serde(default)]
    pub bot: bool,
}

/// A rich embed, both as sent and as read back from history.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Embed {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}
