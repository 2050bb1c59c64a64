//! One ingestion cycle: sources in, small ordered batches out.
//!
//! For each source, in configured order:
//!
//! 1. **Collect**: read the feed; if there is no feed or nothing survives the
//!    keyword blocklist, scrape the listing page with the matching strategy
//! 2. **Normalize**: validate candidates into [`NewsItem`]s
//! 3. **Filter**: drop links already in the dedup store
//! 4. **Batch**: keep the oldest [`BATCH_CAP`] of the fresh items (inputs are
//!    newest-first) and deliver them oldest-first
//! 5. **Deliver**: resolve a preview image, publish, and mark the link as seen
//!    only after the publisher accepted it
//!
//! Nothing that goes wrong for one item or one source stops the rest of the
//! cycle. An item whose delivery failed stays unmarked and comes back as
//! fresh on the next cycle.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use itertools::Itertools;
use rand::{Rng, rng};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

use crate::feed::FeedFetcher;
use crate::http::{PageFetcher, Session};
use crate::models::{NewsItem, RawCandidate, Source};
use crate::normalize::ItemNormalizer;
use crate::publish::Publisher;
use crate::scrapers::StrategyRegistry;
use crate::store::DedupStore;

/// Maximum items delivered per source per cycle.
pub const BATCH_CAP: usize = 5;

/// Tunables of a cycle.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    /// Maximum deliveries per source per cycle.
    pub batch_cap: usize,
    /// Lower bound of the random pause before each source.
    pub pause_min: Duration,
    /// Upper bound of the random pause before each source.
    pub pause_max: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            batch_cap: BATCH_CAP,
            pause_min: Duration::from_millis(500),
            pause_max: Duration::from_millis(1500),
        }
    }
}

impl CycleSettings {
    /// Same cap, no pauses. Used by tests and `--once` runs against fixtures.
    pub fn without_pause() -> Self {
        Self {
            pause_min: Duration::ZERO,
            pause_max: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Where a source's candidates came from this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Feed,
    Page,
}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Via::Feed => f.write_str("feed"),
            Via::Page => f.write_str("page"),
        }
    }
}

/// Outcome for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub via: Via,
    /// Valid items after normalization.
    pub fetched: usize,
    /// Items not yet in the dedup store.
    pub fresh: usize,
    /// Links delivered, in delivery order.
    pub delivered: Vec<String>,
    /// Links whose delivery failed.
    pub failed: Vec<String>,
}

/// Outcome of a whole cycle, one entry per source in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn delivered(&self) -> usize {
        self.sources.iter().map(|s| s.delivered.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().map(|s| s.failed.len()).sum()
    }

    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Pick what to deliver from `fresh` (newest-first): the last `cap` items,
/// reversed, so the oldest of them goes out first.
pub fn select_batch<T>(mut fresh: Vec<T>, cap: usize) -> Vec<T> {
    let start = fresh.len().saturating_sub(cap);
    let mut batch = fresh.split_off(start);
    batch.reverse();
    batch
}

/// The ingestion orchestrator.
///
/// Owns the fetchers, the strategy registry, the store and the publisher for
/// the process lifetime. The scheduler only ever calls [`Self::run_once`].
pub struct IngestionCycle<S, P> {
    sources: Vec<Source>,
    feeds: FeedFetcher,
    pages: PageFetcher,
    strategies: StrategyRegistry,
    normalizer: ItemNormalizer,
    store: S,
    publisher: P,
    settings: CycleSettings,
}

impl<S, P> IngestionCycle<S, P>
where
    S: DedupStore,
    P: Publisher,
{
    /// Wire a cycle around one shared `session`.
    pub fn new(
        sources: Vec<Source>,
        session: &Session,
        normalizer: ItemNormalizer,
        store: S,
        publisher: P,
    ) -> Self {
        Self {
            sources,
            feeds: FeedFetcher::new(session.clone()),
            pages: PageFetcher::new(session.clone()),
            strategies: StrategyRegistry::default(),
            normalizer,
            store,
            publisher,
            settings: CycleSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CycleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Run one full cycle over every configured source.
    #[instrument(level = "info", skip(self))]
    pub async fn run_once(&self) -> CycleReport {
        info!(sources = self.sources.len(), "Checking sources");
        let mut report = CycleReport::default();

        for source in &self.sources {
            self.pause().await;
            report.sources.push(self.process_source(source).await);
        }

        info!(
            delivered = report.delivered(),
            failed = report.failed(),
            "Cycle complete"
        );
        report
    }

    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    async fn process_source(&self, source: &Source) -> SourceReport {
        let (candidates, via) = self.collect(source).await;
        let items = self.normalizer.normalize_all(candidates, &source.name);
        let fetched = items.len();

        let fresh = self.filter_unseen(items).await;
        let fresh_count = fresh.len();
        let batch = select_batch(fresh, self.settings.batch_cap);

        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for item in &batch {
            if self.deliver(item).await {
                delivered.push(item.key().to_string());
            } else {
                failed.push(item.key().to_string());
            }
        }

        info!(
            %via,
            fetched,
            fresh = fresh_count,
            delivered = delivered.len(),
            failed = failed.len(),
            "Source processed"
        );

        SourceReport {
            name: source.name.clone(),
            via,
            fetched,
            fresh: fresh_count,
            delivered,
            failed,
        }
    }

    /// Feed first; the listing page when the feed is absent or has nothing
    /// left after the keyword blocklist.
    async fn collect(&self, source: &Source) -> (Vec<RawCandidate>, Via) {
        let keywords = self.normalizer.keywords();
        if let Some(feed_url) = &source.feed_url {
            let from_feed = self.feeds.fetch(feed_url, keywords).await;
            if !from_feed.is_empty() {
                return (from_feed, Via::Feed);
            }
            info!(url = %feed_url, "Feed empty; falling back to listing page");
        }
        let from_page = self
            .strategies
            .extract(&self.pages, &source.page_url, keywords)
            .await;
        (from_page, Via::Page)
    }

    /// Keep items whose link is not in the store, preserving order.
    ///
    /// A store error for a link counts as "seen": skipping is recoverable,
    /// a duplicate post is not.
    async fn filter_unseen(&self, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let mut fresh = Vec::with_capacity(items.len());
        for item in items.into_iter().unique_by(|i| i.link.clone()) {
            match self.store.seen(item.key()).await {
                Ok(false) => fresh.push(item),
                Ok(true) => debug!(url = %item.link, "Already posted"),
                Err(e) => error!(url = %item.link, error = %e, "Dedup lookup failed; skipping"),
            }
        }
        fresh
    }

    /// Deliver one item and mark it seen. Returns whether it was delivered.
    async fn deliver(&self, item: &NewsItem) -> bool {
        let image = self.normalizer.preview_image(&self.pages, &item.link).await;

        if let Err(e) = self.publisher.deliver(item, image.as_deref()).await {
            error!(url = %item.link, source = %item.source_name, error = %e, "Send failed");
            return false;
        }

        match self
            .store
            .mark_seen(item.key(), &item.source_name, Utc::now())
            .await
        {
            Ok(_) => info!(title = %item.title, url = %item.link, "Posted"),
            Err(e) => error!(
                url = %item.link,
                error = %e,
                "Delivered but could not record; item may be posted again"
            ),
        }
        true
    }

    async fn pause(&self) {
        let min = self.settings.pause_min.as_millis() as u64;
        let max = (self.settings.pause_max.as_millis() as u64).max(min);
        if max == 0 {
            return;
        }
        let ms = rng().random_range(min..=max);
        sleep(Duration::from_millis(ms)).await;
    }
}
