//! News listing scrapers.
//!
//! A scraper turns the source site's listing page into [`Article`]s in the
//! page's own order (newest first). Individual malformed entries are logged
//! and skipped; only a failure to fetch the page itself is an error.
//!
//! # Supported Sources
//!
//! | Source | Module | Listing |
//! |--------|--------|---------|
//! | SUZ CVUT | [`suz`] | `https://suz.cvut.cz/cz/aktuality` |

use crate::error::Result;
use crate::models::Article;

pub mod suz;

/// A page that lists news articles.
pub trait ListingSource {
    /// Fetch the listing and return its articles, newest first.
    async fn fetch_articles(&self) -> Result<Vec<Article>>;
}
