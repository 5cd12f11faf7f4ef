//! Web archival client for the Internet Archive's Wayback Machine.
//!
//! Archiving is triggered with `GET <base>/save/<url>`; the copy is then
//! reachable as `<base>/web/<url>`, which is the reference URL handed back
//! to callers. [`parse_archived_url`] is the inverse used when reading the
//! channel history back.
//!
//! When a whole article is archived, every link in the article's content
//! block is archived first (attachments, linked forms), so the copy keeps
//! working even if the origin site later replaces those files. Those extra
//! submissions are best effort.

use crate::error::{Error, Result};
use crate::scrapers::suz::article_body_links;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default Wayback Machine endpoint.
pub const WAYBACK_BASE: &str = "https://web.archive.org";

/// A service that stores long-term copies of web pages.
pub trait Archiver {
    /// Archive a single page and return the archived copy's URL.
    async fn archive_page(&self, url: &str) -> Result<String>;

    /// Archive an article page along with the resources it links to.
    ///
    /// Only the failure to archive the article page itself is an error.
    async fn archive_article(&self, url: &str) -> Result<String>;
}

/// [`Archiver`] backed by the Wayback Machine "save page now" endpoint.
#[derive(Debug, Clone)]
pub struct WaybackArchiver {
    client: reqwest::Client,
    base: String,
}

impl WaybackArchiver {
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Reference URL of the archived copy of `url`.
    pub fn archived_url(&self, url: &str) -> String {
        format!("{}/web/{}", self.base, url)
    }

    fn save_url(&self, url: &str) -> String {
        format!("{}/save/{}", self.base, url)
    }

    /// Fetch the article page and collect the links in its content block.
    async fn linked_resources(&self, url: &str) -> Result<Vec<String>> {
        let page = Url::parse(url)?;
        let html = self
            .client
            .get(page.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(article_body_links(&html, &page))
    }
}

impl Archiver for WaybackArchiver {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn archive_page(&self, url: &str) -> Result<String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Archive {
                url: url.to_string(),
                reason: "URL has no http(s) scheme".to_string(),
            });
        }

        let response = self
            .client
            .get(self.save_url(url))
            .send()
            .await
            .map_err(|e| Error::Archive {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Archive {
                url: url.to_string(),
                reason: format!("archive answered {status}"),
            });
        }

        let archived = self.archived_url(url);
        info!(%archived, "Archive successful");
        Ok(archived)
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn archive_article(&self, url: &str) -> Result<String> {
        let links = match self.linked_resources(url).await {
            Ok(links) => links,
            Err(e) => {
                warn!(error = %e, "Could not read article page; archiving it without its links");
                Vec::new()
            }
        };
        debug!(count = links.len(), "Found linked resources");

        let failed = stream::iter(links)
            .then(|link| async move {
                match self.archive_page(&link).await {
                    Ok(_) => false,
                    Err(e) => {
                        warn!(%link, error = %e, "Failed to archive linked resource");
                        true
                    }
                }
            })
            .filter(|failed| std::future::ready(*failed))
            .count()
            .await;
        if failed > 0 {
            warn!(failed, "Some linked resources were not archived");
        }

        self.archive_page(url).await
    }
}

/// Recover the original URL wrapped in a Wayback Machine reference URL.
///
/// Accepts `http(s)://web.archive.org/web/<original>` with an optional
/// capture timestamp segment (`/web/20240301000000/<original>`). A wrapped
/// URL that lost its scheme is given `https://`. Returns `None` when `url`
/// is not an archive reference.
///
/// ```ignore
/// assert_eq!(
///     parse_archived_url("https://web.archive.org/web/http://example.com/x").as_deref(),
///     Some("http://example.com/x")
/// );
/// ```
pub fn parse_archived_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("web.archive.org/web/")?;

    // Skip a capture timestamp such as "20240301000000" or "20240301000000id_".
    let rest = match rest.split_once('/') {
        Some((segment, tail))
            if segment.starts_with(|c: char| c.is_ascii_digit())
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            tail
        }
        _ => rest,
    };

    if rest.is_empty() {
        return None;
    }
    if rest.starts_with("http://") || rest.starts_with("https://") {
        Some(rest.to_string())
    } else {
        Some(format!("https://{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archived_url_format() {
        let archiver = WaybackArchiver::new(reqwest::Client::new(), "https://web.archive.org/");
        assert_eq!(
            archiver.archived_url("https://www.suz.cvut.cz/cz/aktuality"),
            "https://web.archive.org/web/https://www.suz.cvut.cz/cz/aktuality"
        );
        assert_eq!(
            archiver.save_url("https://example.com/x"),
            "https://web.archive.org/save/https://example.com/x"
        );
    }

    #[test]
    fn test_parse_archived_url_keeps_wrapped_scheme() {
        assert_eq!(
            parse_archived_url("https://web.archive.org/web/https://example.com/x").as_deref(),
            Some("https://example.com/x")
        );
        assert_eq!(
            parse_archived_url("https://web.archive.org/web/http://example.com/x").as_deref(),
            Some("http://example.com/x")
        );
        assert_eq!(
            parse_archived_url("http://web.archive.org/web/https://example.com/x").as_deref(),
            Some("https://example.com/x")
        );
    }

    #[test]
    fn test_parse_archived_url_with_timestamp() {
        assert_eq!(
            parse_archived_url("https://web.archive.org/web/20240301120000/https://example.com/x")
                .as_deref(),
            Some("https://example.com/x")
        );
        assert_eq!(
            parse_archived_url("https://web.archive.org/web/20240301id_/http://example.com/x")
                .as_deref(),
            Some("http://example.com/x")
        );
    }

    #[test]
    fn test_parse_archived_url_without_scheme() {
        assert_eq!(
            parse_archived_url("https://web.archive.org/web/example.com/x").as_deref(),
            Some("https://example.com/x")
        );
    }

    #[test]
    fn test_parse_archived_url_rejects_other_urls() {
        assert_eq!(parse_archived_url("https://example.com/x"), None);
        assert_eq!(parse_archived_url("https://web.archive.org/web/"), None);
        assert_eq!(parse_archived_url("ftp://web.archive.org/web/x"), None);
    }

    #[tokio::test]
    async fn test_archive_page_rejects_relative_url() {
        let archiver = WaybackArchiver::new(reqwest::Client::new(), WAYBACK_BASE);
        let err = archiver.archive_page("/cz/aktuality").await.unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
    }

    mod wayback {
        use super::*;
        use wiremock::matchers::{method, path, path_regex};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const ARTICLE_PAGE: &str = r#"
            <html><body>
            <div class="block-suzcvut-content"><div class="body">
              <p>Přihlášky <a href="/files/prihlaska.pdf">zde</a>.</p>
            </div></div>
            </body></html>
        "#;

        #[tokio::test]
        async fn test_successful_save_returns_reference_url() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/https:/+www\.suz\.cvut\.cz/cz/aktuality$"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;

            let archiver = WaybackArchiver::new(reqwest::Client::new(), &server.uri());
            let archived = archiver
                .archive_page("https://www.suz.cvut.cz/cz/aktuality")
                .await
                .unwrap();

            assert_eq!(
                archived,
                format!("{}/web/https://www.suz.cvut.cz/cz/aktuality", server.uri())
            );
        }

        #[tokio::test]
        async fn test_non_success_save_is_an_archive_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/"))
                .respond_with(ResponseTemplate::new(520))
                .mount(&server)
                .await;

            let archiver = WaybackArchiver::new(reqwest::Client::new(), &server.uri());
            let err = archiver
                .archive_page("https://www.suz.cvut.cz/cz/aktuality/x")
                .await
                .unwrap_err();

            match err {
                Error::Archive { url, reason } => {
                    assert_eq!(url, "https://www.suz.cvut.cz/cz/aktuality/x");
                    assert!(reason.contains("520"), "{reason}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_linked_resource_failure_still_archives_article() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/cz/aktuality/prihlasky"))
                .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_PAGE))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/.*/files/prihlaska\.pdf$"))
                .respond_with(ResponseTemplate::new(503))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/.*/cz/aktuality/prihlasky$"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;

            let archiver = WaybackArchiver::new(reqwest::Client::new(), &server.uri());
            let article = format!("{}/cz/aktuality/prihlasky", server.uri());
            let archived = archiver.archive_article(&article).await.unwrap();

            assert_eq!(archived, archiver.archived_url(&article));
        }

        #[tokio::test]
        async fn test_unreadable_article_page_is_archived_without_links() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/cz/aktuality/zmizela"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/.*/cz/aktuality/zmizela$"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;

            let archiver = WaybackArchiver::new(reqwest::Client::new(), &server.uri());
            let article = format!("{}/cz/aktuality/zmizela", server.uri());

            assert!(archiver.archive_article(&article).await.is_ok());
        }

        #[tokio::test]
        async fn test_failed_article_save_fails_the_article() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/cz/aktuality/prihlasky"))
                .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_PAGE))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/.*/files/prihlaska\.pdf$"))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/save/.*/cz/aktuality/prihlasky$"))
                .respond_with(ResponseTemplate::new(502))
                .mount(&server)
                .await;

            let archiver = WaybackArchiver::new(reqwest::Client::new(), &server.uri());
            let article = format!("{}/cz/aktuality/prihlasky", server.uri());
            let err = archiver.archive_article(&article).await.unwrap_err();

            assert!(matches!(err, Error::Archive { .. }));
        }
    }
}
