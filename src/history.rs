//! Rebuilds the announced record from the channel history.
//!
//! Only messages written by the session's own account and carrying an embed
//! count as announcements. Anything else in the channel is logged as suspicious and
//! ignored, as is a single announcement whose embed cannot be interpreted.

use crate::archive::parse_archived_url;
use crate::chat::ChatSession;
use crate::dedup::{AnnouncedRecord, Strategy};
use crate::error::{Error, Result};
use crate::models::{ChatMessage, Embed};
use chrono::DateTime;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Canonical article URL behind an embed link.
///
/// Links wrapped by the archival service are unwrapped; any other link is
/// already canonical.
pub fn canonical_url(embed_url: &str) -> String {
    parse_archived_url(embed_url).unwrap_or_else(|| embed_url.to_string())
}

/// The embed of an announcement, or `None` for foreign/embed-less messages.
fn announcement_embed<'a>(message: &'a ChatMessage, own_id: &str) -> Option<&'a Embed> {
    if message.author.id != own_id {
        warn!(
            id = %message.id,
            author = %message.author.username,
            bot = message.author.bot,
            "Found a suspicious message from another author"
        );
        return None;
    }
    let embed = message.embeds.first();
    if embed.is_none() {
        warn!(id = %message.id, author = %message.author.username, "Found a suspicious message without an embed");
    }
    embed
}

/// Reduce history messages to an [`AnnouncedRecord`].
///
/// `own_id` is the account id of the announcer; messages by anyone else,
/// other bots included, are ignored.
pub fn reconstruct(messages: &[ChatMessage], own_id: &str, strategy: Strategy) -> AnnouncedRecord {
    let embeds = messages
        .iter()
        .filter_map(|m| announcement_embed(m, own_id).map(|e| (m, e)));

    match strategy {
        Strategy::Url => {
            let urls: HashSet<String> = embeds
                .filter_map(|(message, embed)| match embed.url.as_deref() {
                    Some(url) if !url.is_empty() => Some(canonical_url(url)),
                    _ => {
                        warn!(id = %message.id, "Announcement embed has no link");
                        None
                    }
                })
                .collect();
            debug!(count = urls.len(), "Reconstructed announced URLs");
            AnnouncedRecord::from_urls(urls)
        }
        Strategy::Date => {
            let latest = embeds
                .filter_map(|(message, embed)| {
                    let raw = embed.timestamp.as_deref()?;
                    match DateTime::parse_from_rfc3339(raw) {
                        Ok(ts) => Some(ts.date_naive()),
                        Err(e) => {
                            warn!(id = %message.id, timestamp = raw, error = %e, "Unparseable embed timestamp");
                            None
                        }
                    }
                })
                .max()
                // 1970-01-01
                .unwrap_or_default();
            debug!(%latest, "Reconstructed announced watermark");
            AnnouncedRecord::Watermark(latest)
        }
    }
}

/// Read the last `limit` channel messages and rebuild the announced record.
///
/// # Arguments
///
/// * `session` - An open chat session; its [`ChatSession::user_id`] decides
///   which messages count as announcements
/// * `channel` - Destination channel id
/// * `limit` - How many recent messages to scan
/// * `strategy` - Whether to collect URLs or a date watermark
///
/// # Returns
///
/// The [`AnnouncedRecord`] for `strategy`, or [`Error::History`] when the
/// history cannot be read. That error is fatal: without the history there
/// is no way to know what is new.
#[instrument(level = "info", skip_all, fields(%channel, limit, %strategy))]
pub async fn read_announced<S: ChatSession>(
    session: &S,
    channel: &str,
    limit: u8,
    strategy: Strategy,
) -> Result<AnnouncedRecord> {
    let messages = session
        .read_recent_messages(channel, limit)
        .await
        .map_err(|e| Error::History(e.to_string()))?;
    info!(count = messages.len(), "Read messages from the channel");
    Ok(reconstruct(&messages, session.user_id(), strategy))
}
