//! Posts article announcements to the chat channel.

use crate::chat::ChatSession;
use crate::error::Result;
use crate::models::{Article, MessageId};
use crate::render::render_embed;
use tracing::{info, instrument, warn};

/// Post `article` to `channel` and cross-post it to following channels.
///
/// # Arguments
///
/// * `session` - An open chat session
/// * `channel` - Destination channel id
/// * `article` - The article to announce
/// * `archived_url` - Reference URL of the article's archived copy, linked
///   from the embed description
///
/// # Returns
///
/// The id of the posted message. Only a failed send is an error; a failed
/// cross-post is logged and the message is neither retracted nor retried.
#[instrument(level = "info", skip_all, fields(%channel, title = %article.title))]
pub async fn publish<S: ChatSession>(
    session: &S,
    channel: &str,
    article: &Article,
    archived_url: &str,
) -> Result<MessageId> {
    let embed = render_embed(article, archived_url);
    let id = session.send_message(channel, &embed).await?;
    info!(message = %id, url = %article.canonical_url, "Sent article");

    if let Err(e) = session.crosspost(channel, &id).await {
        warn!(message = %id, error = %e, "Failed to publish article to following channels");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChat, article};

    #[tokio::test]
    async fn test_publish_sends_then_crossposts() {
        let chat = FakeChat::default();
        let a = article("koncert", Some("Akce"));

        let id = publish(&chat, "42", &a, "https://web.archive.org/web/x").await.unwrap();

        let sent = chat.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].embed.url.as_deref(), Some(a.canonical_url.as_str()));
        assert_eq!(sent[0].embed.color, Some(0x89f336));
        assert_eq!(chat.crossposted(), vec![id]);
    }

    #[tokio::test]
    async fn test_crosspost_failure_keeps_message() {
        let chat = FakeChat::default().failing_crosspost();
        let a = article("koncert", None);

        let result = publish(&chat, "42", &a, "https://web.archive.org/web/x").await;

        assert!(result.is_ok());
        assert_eq!(chat.sent().len(), 1);
        assert!(chat.crossposted().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let chat = FakeChat::default().failing_send();
        let a = article("koncert", None);

        assert!(publish(&chat, "42", &a, "https://web.archive.org/web/x").await.is_err());
        assert!(chat.crossposted().is_empty());
    }
}
