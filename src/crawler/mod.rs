//! Crawler module for catalog fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a fixed store identity
//! - Pagination, product card and product page extraction
//! - Per-group concurrency limits
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::Coordinator;
pub use extractor::{
    CatalogExtractor, ExtractError, MarkupExtractor, ProductField, MAX_LISTING_PAGES,
};
pub use fetcher::{build_http_client, fetch_url, FetchError, Fetcher, HttpFetcher};
pub use scheduler::{FetchGroup, FetchLimiter};

pub use crate::output::CrawlReport;

use crate::config::{validate, Config};
use crate::output::CsvSink;
use crate::HarvestError;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Runs a complete crawl operation
///
/// This is the main entry point for a configured crawl. It will:
/// 1. Validate the configuration and build the HTTP client with the configured store identity
/// 2. Create the CSV output and write its header
/// 3. Crawl the configured start URL until done or `shutdown` resolves
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (possibly degraded or cancelled)
/// * `Err(HarvestError)` - The configuration is invalid, the output could not
///   be created, or the start page could not be fetched
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::Config;
/// use catalog_ripple::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(&Config::default(), std::future::pending()).await?;
/// println!("{} records written", report.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<C>(config: &Config, shutdown: C) -> Result<CrawlReport, HarvestError>
where
    C: Future<Output = ()>,
{
    validate(config)?;
    let start_url = Url::parse(&config.crawler.start_url)?;
    let coordinator = Coordinator::from_config(config)?;

    let sink = Arc::new(CsvSink::create(Path::new(&config.output.csv_path))?);
    tracing::info!("Writing products to {}", config.output.csv_path);

    coordinator.crawl_until(&start_url, sink, shutdown).await
}
