//! The chat-platform operations the pipeline relies on.
//!
//! A [`ChatConnector`] opens one [`ChatSession`] per poll cycle. The session
//! is consumed by [`ChatSession::disconnect`], so it cannot be used after it
//! has been closed.

use crate::error::Result;
use crate::models::{ChatMessage, Embed, MessageId};

pub trait ChatConnector {
    type Session: ChatSession;

    /// Authenticate and open a session.
    async fn connect(&self) -> Result<Self::Session>;
}

pub trait ChatSession {
    /// Account id of the authenticated user; its messages are announcements.
    fn user_id(&self) -> &str;

    /// Up to `limit` most recent messages of `channel`, newest first.
    async fn read_recent_messages(&self, channel: &str, limit: u8) -> Result<Vec<ChatMessage>>;

    /// Post a message carrying a single embed.
    async fn send_message(&self, channel: &str, embed: &Embed) -> Result<MessageId>;

    /// Distribute a posted message to the channels following `channel`.
    async fn crosspost(&self, channel: &str, message: &str) -> Result<()>;

    /// Close the session.
    async fn disconnect(self);
}
