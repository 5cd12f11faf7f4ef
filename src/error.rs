//! Error taxonomy for the announcement pipeline.
//!
//! Errors fall into two groups. Fatal errors ([`Error::is_fatal`]) mean the
//! process can no longer tell what has already been announced, so it stops.
//! Everything else concerns a single item (one article, one linked file, one
//! cross-post) and is logged while the cycle carries on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The chat platform answered with a non-success status.
    #[error("chat API returned {status}: {body}")]
    Chat { status: u16, body: String },

    /// Authentication or connection to the chat platform failed.
    #[error("failed to connect to the chat platform: {0}")]
    Connect(String),

    /// Channel history could not be read.
    #[error("failed to read channel history: {0}")]
    History(String),

    #[error("failed to archive {url}: {reason}")]
    Archive { url: String, reason: String },

    #[error("failed to extract articles: {0}")]
    Extraction(String),
}

impl Error {
    /// Whether the process must stop instead of waiting for the next poll.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Connect(_) | Error::History(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
