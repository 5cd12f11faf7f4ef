//! Discord REST adapter implementing [`ChatConnector`] and [`ChatSession`].
//!
//! Only four endpoints are used:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | connect | `GET /users/@me` |
//! | read history | `GET /channels/{channel}/messages?limit=N` |
//! | send | `POST /channels/{channel}/messages` |
//! | crosspost | `POST /channels/{channel}/messages/{message}/crosspost` |

use crate::chat::{ChatConnector, ChatSession};
use crate::error::{Error, Result};
use crate::models::{ChatMessage, Embed, MessageId};
use crate::utils::truncate_for_log;
use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::{debug, info, instrument};

/// Discord API base URL (v10).
pub const API_BASE: &str = "https://discord.com/api/v10";

/// Discord refuses history pages larger than this.
pub const MAX_HISTORY_LIMIT: u8 = 100;

/// The bot account behind the token.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: MessageId,
}

/// Opens authenticated Discord sessions.
#[derive(Clone)]
pub struct DiscordConnector {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl DiscordConnector {
    pub fn new(client: reqwest::Client, token: impl Into<String>, api_base: &str) -> Self {
        Self {
            client,
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl fmt::Debug for DiscordConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConnector")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ChatConnector for DiscordConnector {
    type Session = DiscordSession;

    #[instrument(level = "info", skip_all)]
    async fn connect(&self) -> Result<DiscordSession> {
        let http = DiscordHttp {
            client: self.client.clone(),
            token: self.token.clone(),
            api_base: self.api_base.clone(),
        };

        let user: CurrentUser = http
            .request(Method::GET, "/users/@me", None)
            .await
            .map_err(|e| Error::Connect(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;

        info!(user = %user.username, id = %user.id, "Connected to Discord");
        Ok(DiscordSession { http, user })
    }
}

/// An authenticated Discord session.
pub struct DiscordSession {
    http: DiscordHttp,
    user: CurrentUser,
}

impl ChatSession for DiscordSession {
    fn user_id(&self) -> &str {
        &self.user.id
    }

    #[instrument(level = "info", skip_all, fields(%channel, limit))]
    async fn read_recent_messages(&self, channel: &str, limit: u8) -> Result<Vec<ChatMessage>> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let path = format!("/channels/{channel}/messages?limit={limit}");
        let messages: Vec<ChatMessage> = self
            .http
            .request(Method::GET, &path, None)
            .await?
            .json()
            .await?;
        debug!(count = messages.len(), "Read channel history");
        Ok(messages)
    }

    #[instrument(level = "info", skip_all, fields(%channel))]
    async fn send_message(&self, channel: &str, embed: &Embed) -> Result<MessageId> {
        let path = format!("/channels/{channel}/messages");
        let body = json!({ "embeds": [embed] });
        let created: CreatedMessage = self
            .http
            .request(Method::POST, &path, Some(body))
            .await?
            .json()
            .await?;
        Ok(created.id)
    }

    #[instrument(level = "info", skip_all, fields(%channel, %message))]
    async fn crosspost(&self, channel: &str, message: &str) -> Result<()> {
        let path = format!("/channels/{channel}/messages/{message}/crosspost");
        self.http.request(Method::POST, &path, None).await?;
        Ok(())
    }

    async fn disconnect(self) {
        info!(user = %self.user.username, "Disconnected from Discord");
    }
}

struct DiscordHttp {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl DiscordHttp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bot {}", self.token));
        if let Some(payload) = body {
            builder = builder.json(&payload);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(Error::Chat {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }
        Ok(response)
    }
}
