//! In-memory stand-ins for the listing, the archive and the chat channel.

use crate::archive::Archiver;
use crate::chat::{ChatConnector, ChatSession};
use crate::error::{Error, Result};
use crate::models::{Article, ChatMessage, Embed, MessageAuthor, MessageId};
use crate::scrapers::ListingSource;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Account id the fake chat session is authenticated as.
pub const BOT_USER_ID: &str = "1000";

pub fn article(slug: &str, category: Option<&str>) -> Article {
    Article {
        image_url: None,
        title: format!("Article {slug}"),
        body_excerpt: format!("About {slug}."),
        canonical_url: format!("https://suz.cvut.cz/cz/aktuality/{slug}"),
        category: category.map(str::to_string),
        published_date: None,
    }
}

/// Listing whose content the test can change between cycles.
#[derive(Clone, Default)]
pub struct FakeListing {
    articles: Arc<Mutex<Vec<Article>>>,
    failing: bool,
}

impl FakeListing {
    /// Articles in page order, newest first.
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles: Arc::new(Mutex::new(articles)),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Put a new article at the top of the listing.
    pub fn push_newest(&self, article: Article) {
        self.articles.lock().unwrap().insert(0, article);
    }
}

impl ListingSource for FakeListing {
    async fn fetch_articles(&self) -> Result<Vec<Article>> {
        if self.failing {
            return Err(Error::Extraction("listing unavailable".to_string()));
        }
        Ok(self.articles.lock().unwrap().clone())
    }
}

/// Archive that fails for chosen URLs and records every submission.
#[derive(Clone, Default)]
pub struct FakeArchiver {
    failing: Arc<Mutex<HashSet<String>>>,
    pages: Arc<Mutex<Vec<String>>>,
    articles: Arc<Mutex<Vec<String>>>,
}

impl FakeArchiver {
    pub fn fail_for(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn recover(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    /// URLs submitted through `archive_page`.
    pub fn pages(&self) -> Vec<String> {
        self.pages.lock().unwrap().clone()
    }

    /// URLs submitted through `archive_article`.
    pub fn articles(&self) -> Vec<String> {
        self.articles.lock().unwrap().clone()
    }

    fn outcome(&self, url: &str) -> Result<String> {
        if self.failing.lock().unwrap().contains(url) {
            return Err(Error::Archive {
                url: url.to_string(),
                reason: "archive answered 520".to_string(),
            });
        }
        Ok(format!("https://web.archive.org/web/{url}"))
    }
}

impl Archiver for FakeArchiver {
    async fn archive_page(&self, url: &str) -> Result<String> {
        self.pages.lock().unwrap().push(url.to_string());
        self.outcome(url)
    }

    async fn archive_article(&self, url: &str) -> Result<String> {
        self.articles.lock().unwrap().push(url.to_string());
        self.outcome(url)
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel: String,
    pub embed: Embed,
}

#[derive(Default)]
struct ChatState {
    /// Channel history, newest first.
    history: Vec<ChatMessage>,
    sent: Vec<SentMessage>,
    crossposted: Vec<MessageId>,
    connects: usize,
    disconnects: usize,
    next_id: u64,
}

/// Chat channel kept in memory; posted messages show up in its history.
#[derive(Clone, Default)]
pub struct FakeChat {
    state: Arc<Mutex<ChatState>>,
    fail_connect: bool,
    fail_history: bool,
    fail_send: bool,
    fail_crosspost: bool,
}

impl FakeChat {
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn failing_crosspost(mut self) -> Self {
        self.fail_crosspost = true;
        self
    }

    /// Add a message written by someone else.
    pub fn add_foreign_message(&self, text: &str) {
        self.push_foreign(
            MessageAuthor {
                id: "2000".to_string(),
                username: text.to_string(),
                bot: false,
            },
            Vec::new(),
        );
    }

    /// Add an embed linking `url` posted by a different bot account.
    pub fn add_other_bot_embed(&self, url: &str) {
        self.push_foreign(
            MessageAuthor {
                id: "3000".to_string(),
                username: "other-bot".to_string(),
                bot: true,
            },
            vec![Embed {
                url: Some(url.to_string()),
                ..Default::default()
            }],
        );
    }

    fn push_foreign(&self, author: MessageAuthor, embeds: Vec<Embed>) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("foreign-{}", state.next_id);
        state.history.insert(0, ChatMessage { id, author, embeds });
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_urls(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| m.embed.url)
            .collect()
    }

    pub fn crossposted(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().crossposted.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

impl ChatConnector for FakeChat {
    type Session = FakeChat;

    async fn connect(&self) -> Result<FakeChat> {
        if self.fail_connect {
            return Err(Error::Connect("401 Unauthorized".to_string()));
        }
        self.state.lock().unwrap().connects += 1;
        Ok(self.clone())
    }
}

impl ChatSession for FakeChat {
    fn user_id(&self) -> &str {
        BOT_USER_ID
    }

    async fn read_recent_messages(&self, _channel: &str, limit: u8) -> Result<Vec<ChatMessage>> {
        if self.fail_history {
            return Err(Error::Chat {
                status: 403,
                body: "Missing Access".to_string(),
            });
        }
        let state = self.state.lock().unwrap();
        Ok(state.history.iter().take(limit as usize).cloned().collect())
    }

    async fn send_message(&self, channel: &str, embed: &Embed) -> Result<MessageId> {
        if self.fail_send {
            return Err(Error::Chat {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id.to_string();
        state.sent.push(SentMessage {
            channel: channel.to_string(),
            embed: embed.clone(),
        });
        state.history.insert(
            0,
            ChatMessage {
                id: id.clone(),
                author: MessageAuthor {
                    id: BOT_USER_ID.to_string(),
                    username: "suz-bot".to_string(),
                    bot: true,
                },
                embeds: vec![embed.clone()],
            },
        );
        Ok(id)
    }

    async fn crosspost(&self, _channel: &str, message: &str) -> Result<()> {
        if self.fail_crosspost {
            return Err(Error::Chat {
                status: 403,
                body: "Not an announcement channel".to_string(),
            });
        }
        self.state.lock().unwrap().crossposted.push(message.to_string());
        Ok(())
    }

    async fn disconnect(self) {
        self.state.lock().unwrap().disconnects += 1;
    }
}
