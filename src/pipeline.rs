//! The poll scheduler: one announcement cycle, repeated forever.
//!
//! A cycle moves through these states:
//!
//! ```text
//! Idle -> Extracting -> ReconstructingHistory -> Deciding -> Publishing(0..k)
//!      -> ArchivingRoot (only if k > 0) -> Sleeping -> Idle
//! ```
//!
//! Nothing is remembered between cycles; what has been announced is always
//! re-derived from the channel history, so a restart simply resumes. The chat
//! session is opened before the history is read and closed once publishing
//! ends, whatever happened in between.

use crate::archive::Archiver;
use crate::chat::{ChatConnector, ChatSession};
use crate::dedup::{Strategy, decide};
use crate::error::Result;
use crate::history::read_announced;
use crate::models::{ArchiveOutcome, ArchivedArticle, Article};
use crate::publisher::publish;
use crate::scrapers::ListingSource;
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Extracting,
    ReconstructingHistory,
    Deciding,
    /// Publishing the n-th new article (0-based).
    Publishing(usize),
    ArchivingRoot,
    Sleeping,
}

/// Counters describing one finished cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Articles found on the listing.
    pub extracted: usize,
    /// Articles judged new.
    pub decided: usize,
    pub published: usize,
    /// New articles left for the next cycle (archival or send failed).
    pub skipped: usize,
    pub root_archived: bool,
}

/// Settings of the pipeline that do not belong to a collaborator.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub channel_id: String,
    pub history_limit: u8,
    pub strategy: Strategy,
    /// Listing page archived after a cycle that published something.
    pub root_url: String,
    pub poll_interval: Duration,
}

/// Scrape, deduplicate, archive and announce.
pub struct Pipeline<L, A, C> {
    listing: L,
    archiver: A,
    chat: C,
    settings: PipelineSettings,
}

impl<L, A, C> Pipeline<L, A, C>
where
    L: ListingSource,
    A: Archiver,
    C: ChatConnector,
{
    pub fn new(listing: L, archiver: A, chat: C, settings: PipelineSettings) -> Self {
        Self {
            listing,
            archiver,
            chat,
            settings,
        }
    }

    fn enter(&self, state: CycleState) {
        debug!(?state, "Cycle state");
    }

    /// Run one full cycle.
    ///
    /// Only fatal errors are returned (connection or history failures);
    /// per-article problems are logged and counted in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        self.enter(CycleState::Extracting);
        let articles = match self.listing.fetch_articles().await {
            Ok(articles) => articles,
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "Failed to load the listing; nothing to do this cycle");
                return Ok(report);
            }
            Err(e) => return Err(e),
        };
        report.extracted = articles.len();
        info!(count = articles.len(), "Loaded articles");

        let session = self.chat.connect().await?;
        let announced = self.announce(&session, articles, &mut report).await;
        session.disconnect().await;
        announced?;

        if report.published > 0 {
            self.enter(CycleState::ArchivingRoot);
            info!(url = %self.settings.root_url, "Archiving the root page");
            match self.archiver.archive_page(&self.settings.root_url).await {
                Ok(_) => report.root_archived = true,
                Err(e) => warn!(error = %e, "Failed to archive the root page"),
            }
        }

        Ok(report)
    }

    /// Steps that need the chat session: history, decision, publishing.
    async fn announce(
        &self,
        session: &C::Session,
        articles: Vec<Article>,
        report: &mut CycleReport,
    ) -> Result<()> {
        self.enter(CycleState::ReconstructingHistory);
        let announced = read_announced(
            session,
            &self.settings.channel_id,
            self.settings.history_limit,
            self.settings.strategy,
        )
        .await?;

        self.enter(CycleState::Deciding);
        let decision = decide(articles, &announced);
        report.decided = decision.len();
        if decision.is_empty() {
            info!("No new articles");
            return Ok(());
        }

        // A date watermark covers everything up to the newest announcement,
        // so publishing past an unposted article would drop it for good.
        let stop_on_failure = self.settings.strategy == Strategy::Date;
        let total = decision.len();

        for (index, article) in decision.into_iter().enumerate() {
            self.enter(CycleState::Publishing(index));
            info!(title = %article.title, "Sending article");

            let archived = self.archive(article).await;
            let posted = match &archived.archive {
                ArchiveOutcome::Archived(url) => {
                    match publish(session, &self.settings.channel_id, &archived.article, url).await {
                        Ok(_) => true,
                        Err(e) => {
                            error!(title = %archived.article.title, error = %e, "Failed to send article");
                            false
                        }
                    }
                }
                ArchiveOutcome::Failed(reason) => {
                    debug!(url = %archived.article.canonical_url, %reason, "Skipping article this cycle");
                    false
                }
            };

            if posted {
                report.published += 1;
                continue;
            }
            report.skipped += 1;
            if stop_on_failure {
                let held_back = total - index - 1;
                report.skipped += held_back;
                warn!(held_back, "Holding back newer articles until this one is posted");
                break;
            }
        }
        Ok(())
    }

    async fn archive(&self, article: Article) -> ArchivedArticle {
        let archive = match self.archiver.archive_article(&article.canonical_url).await {
            Ok(url) => ArchiveOutcome::Archived(url),
            Err(e) => {
                warn!(title = %article.title, error = %e, "Failed to create an archive link; retrying next cycle");
                ArchiveOutcome::Failed(e.to_string())
            }
        };
        ArchivedArticle { article, archive }
    }

    /// Poll forever. Returns only when a cycle fails fatally.
    pub async fn run_forever(&self) -> Result<Infallible> {
        let mut cycle = 0u64;
        loop {
            cycle += 1;
            self.enter(CycleState::Idle);
            let started = Instant::now();

            let span = info_span!("poll_cycle", cycle);
            match self.run_cycle().instrument(span).await {
                Ok(report) => info!(
                    cycle,
                    extracted = report.extracted,
                    new = report.decided,
                    published = report.published,
                    skipped = report.skipped,
                    root_archived = report.root_archived,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Cycle finished"
                ),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(cycle, error = %e, "Cycle aborted"),
            }

            self.enter(CycleState::Sleeping);
            info!(minutes = self.settings.poll_interval.as_secs() / 60, "Sleeping");
            sleep(self.settings.poll_interval).await;
        }
    }
}
