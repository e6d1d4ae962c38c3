//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives one crawl run:
//! - Fetching the start page and reading its pagination once
//! - Fanning out listing-page fetches, reusing the start page as page 1
//! - Fanning out one detail fetch per in-stock product of each listing page
//! - Merging listing prices with detail attributes and handing records to the sink
//! - Counting every failure without letting it stop sibling work
//!
//! Each listing page runs as its own task and owns the detail tasks it spawns,
//! waiting for all of them before it counts as done. Dropping a run aborts the
//! whole task tree.

use crate::config::Config;
use crate::crawler::extractor::{CatalogExtractor, MarkupExtractor};
use crate::crawler::fetcher::{FetchError, Fetcher, HttpFetcher};
use crate::crawler::scheduler::{FetchGroup, FetchLimiter};
use crate::output::{CrawlCounters, CrawlReport, RecordSink};
use crate::product::{ProductRecord, ProductSummary};
use crate::url::listing_page_url;
use crate::HarvestError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::{JoinError, JoinSet};
use url::Url;

/// Main crawler coordinator structure
///
/// A coordinator holds only immutable collaborators, so one instance can run
/// any number of crawls, including several at once.
pub struct Coordinator<F, E> {
    fetcher: Arc<F>,
    extractor: Arc<E>,
    limiter: FetchLimiter,
    crawl_timeout: Option<Duration>,
}

impl Coordinator<HttpFetcher, CatalogExtractor> {
    /// Creates a coordinator for the live site from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::from_config(
            &config.user_agent,
            &config.session,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        let limiter = FetchLimiter::from_config(&config.crawler);

        let timeout = config.crawler.crawl_timeout_secs;
        let coordinator = Self::new(fetcher, CatalogExtractor::new(), limiter)
            .with_crawl_timeout((timeout > 0).then(|| Duration::from_secs(timeout)));

        Ok(coordinator)
    }
}

impl<F, E> Coordinator<F, E>
where
    F: Fetcher + 'static,
    E: MarkupExtractor + 'static,
{
    pub fn new(fetcher: F, extractor: E, limiter: FetchLimiter) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            limiter,
            crawl_timeout: None,
        }
    }

    /// Abandons crawls that run longer than `timeout`
    pub fn with_crawl_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.crawl_timeout = timeout;
        self
    }

    /// Crawls the category at `start_url`, writing every product to `sink`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran to completion or was cancelled
    /// * `Err(HarvestError::StartPage)` - The start page could not be fetched
    ///
    /// # Example
    ///
    /// ```no_run
    /// use catalog_ripple::config::Config;
    /// use catalog_ripple::crawler::Coordinator;
    /// use catalog_ripple::output::MemorySink;
    /// use std::sync::Arc;
    /// use url::Url;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config::default();
    /// let coordinator = Coordinator::from_config(&config)?;
    /// let sink = Arc::new(MemorySink::new());
    ///
    /// let start = Url::parse(&config.crawler.start_url)?;
    /// let report = coordinator.crawl(&start, sink.clone()).await?;
    /// println!("{} records", report.records);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl<S>(
        &self,
        start_url: &Url,
        sink: Arc<S>,
    ) -> Result<CrawlReport, HarvestError>
    where
        S: RecordSink + 'static,
    {
        self.crawl_until(start_url, sink, std::future::pending()).await
    }

    /// Like [`crawl`](Self::crawl), but abandons the run once `shutdown` resolves
    ///
    /// Stopping before the start page has arrived fails the crawl with
    /// `HarvestError::StartPage`. Stopping later drops every in-flight fetch,
    /// starts nothing further, and returns the report with `cancelled` set.
    /// Records already written stay written; no partial record is ever produced.
    pub async fn crawl_until<S, C>(
        &self,
        start_url: &Url,
        sink: Arc<S>,
        shutdown: C,
    ) -> Result<CrawlReport, HarvestError>
    where
        S: RecordSink + 'static,
        C: Future<Output = ()>,
    {
        let counters = Arc::new(CrawlCounters::new());
        let run = Arc::new(CrawlRun {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            limiter: self.limiter.clone(),
            sink,
            counters: Arc::clone(&counters),
        });

        let deadline = self.crawl_timeout;
        let timeout = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(timeout);

        tracing::info!("Starting crawl of {}", start_url);

        let abandoned = || FetchError::Cancelled {
            url: start_url.to_string(),
        };
        let started = tokio::select! {
            result = run.fetch(FetchGroup::Listing, start_url) => result,
            () = &mut shutdown => {
                tracing::warn!("Shutdown requested before the start page arrived");
                Err(abandoned())
            }
            () = &mut timeout => {
                tracing::warn!(
                    "Crawl timed out after {:?} waiting for the start page",
                    deadline
                );
                Err(abandoned())
            }
        };
        let start_markup = started.map_err(|source| HarvestError::StartPage {
            url: source.url().to_string(),
            source,
        })?;

        tokio::select! {
            () = Arc::clone(&run).execute(start_url.clone(), start_markup) => {}
            () = &mut shutdown => {
                tracing::warn!("Shutdown requested, abandoning in-flight fetches");
                counters.mark_cancelled();
            }
            () = &mut timeout => {
                tracing::warn!(
                    "Crawl timed out after {:?}, abandoning in-flight fetches",
                    deadline
                );
                counters.mark_cancelled();
            }
        }

        let report = counters.snapshot();
        tracing::info!(
            "Crawl finished: {} listing pages, {} products, {} records, {} fetch failures",
            report.listing_pages,
            report.summaries,
            report.records,
            report.fetch_failures()
        );

        Ok(report)
    }
}

/// Markup of a listing page, or the slot reserved for fetching it
enum ListingSource {
    Fetched(String),
    Reserved(OwnedSemaphorePermit),
}

/// Everything the tasks of one crawl share
struct CrawlRun<F, E, S> {
    fetcher: Arc<F>,
    extractor: Arc<E>,
    limiter: FetchLimiter,
    sink: Arc<S>,
    counters: Arc<CrawlCounters>,
}

impl<F, E, S> CrawlRun<F, E, S>
where
    F: Fetcher + 'static,
    E: MarkupExtractor + 'static,
    S: RecordSink + 'static,
{
    /// Crawls every listing page, starting from the already fetched start page
    ///
    /// 1. Read the start page's pagination set
    /// 2. Spawn the start page as page 1 (or as the only page)
    /// 3. Spawn each further page once a listing slot is free for it
    /// 4. Wait for every listing task (and so every detail task)
    async fn execute(self: Arc<Self>, start_url: Url, start_markup: String) {
        let pagination = self.extractor.pagination(&start_markup);

        let mut listings = JoinSet::new();
        match pagination.last_page() {
            None => {
                tracing::info!("No pagination found, crawling {} as a single page", start_url);
                let source = ListingSource::Fetched(start_markup);
                listings.spawn(Arc::clone(&self).process_listing(start_url, source));
            }
            Some(last_page) => {
                tracing::info!("Discovered {} listing pages", last_page);
                let source = ListingSource::Fetched(start_markup);
                let first = listing_page_url(&start_url, 1);
                listings.spawn(Arc::clone(&self).process_listing(first, source));

                for page in pagination.pages().skip(1) {
                    let Some(permit) = self.limiter.acquire(FetchGroup::Listing).await else {
                        break;
                    };
                    let url = listing_page_url(&start_url, page);
                    let source = ListingSource::Reserved(permit);
                    listings.spawn(Arc::clone(&self).process_listing(url, source));
                }
            }
        }

        while let Some(joined) = listings.join_next().await {
            log_join_error(joined, "listing");
        }
    }

    /// Reads one listing page and waits for all of its detail tasks
    async fn process_listing(self: Arc<Self>, url: Url, source: ListingSource) {
        let markup = match source {
            ListingSource::Fetched(markup) => markup,
            ListingSource::Reserved(permit) => match self.fetch_with(permit, &url).await {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::warn!("Listing page lost: {}", e);
                    self.counters.listing_failure();
                    return;
                }
            },
        };

        self.counters.listing_page();
        let summaries = self.extractor.summaries(&markup, &url);
        drop(markup);

        tracing::debug!("{} in-stock products on {}", summaries.len(), url);
        self.counters.add_summaries(summaries.len());

        let mut details = JoinSet::new();
        for summary in summaries {
            let Some(permit) = self.limiter.acquire(FetchGroup::Detail).await else {
                break;
            };
            details.spawn(Arc::clone(&self).process_detail(summary, permit));
        }

        while let Some(joined) = details.join_next().await {
            log_join_error(joined, "detail");
        }

        tracing::debug!("Listing page {} complete", url);
    }

    /// Fetches one product page, merges it with its summary and writes the record
    async fn process_detail(
        self: Arc<Self>,
        summary: ProductSummary,
        permit: OwnedSemaphorePermit,
    ) {
        let markup = match self.fetch_with(permit, &summary.detail_url).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("Product page lost: {}", e);
                self.counters.detail_failure();
                return;
            }
        };

        let attributes = match self.extractor.attributes(&markup) {
            Ok(attributes) => attributes,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", summary.detail_url, e);
                self.counters.extraction_failure();
                return;
            }
        };

        let record = ProductRecord::merge(summary, attributes);
        let url = record.url.clone();
        match self.sink.write(record) {
            Ok(()) => {
                tracing::trace!("Recorded {}", url);
                self.counters.record();
            }
            Err(e) => {
                tracing::error!("Failed to write record for {}: {}", url, e);
                self.counters.sink_failure();
            }
        }
    }

    /// Fetches `url` once a slot in `group` is free
    async fn fetch(&self, group: FetchGroup, url: &Url) -> Result<String, FetchError> {
        let permit = self
            .limiter
            .acquire(group)
            .await
            .ok_or_else(|| FetchError::Cancelled {
                url: url.to_string(),
            })?;
        self.fetch_with(permit, url).await
    }

    /// Fetches `url` in an already reserved slot, freeing it afterwards
    async fn fetch_with(
        &self,
        permit: OwnedSemaphorePermit,
        url: &Url,
    ) -> Result<String, FetchError> {
        tracing::debug!("Fetching {}", url);
        let result = self.fetcher.fetch(url).await;
        drop(permit);
        result
    }
}

fn log_join_error(joined: Result<(), JoinError>, kind: &str) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!("A {} task panicked: {}", kind, e);
        }
    }
}
