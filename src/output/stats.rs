//! Crawl statistics
//!
//! Tasks bump shared atomic counters as they finish; the coordinator turns
//! them into a [`CrawlReport`] once the crawl ends (or is cancelled).

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Outcome of one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Listing pages whose markup was fetched and read
    pub listing_pages: u64,

    /// In-stock product summaries extracted from listing pages
    pub summaries: u64,

    /// Product records accepted by the sink
    pub records: u64,

    /// Listing page fetches that failed
    pub listing_failures: u64,

    /// Detail page fetches that failed
    pub detail_failures: u64,

    /// Detail pages missing a required attribute
    pub extraction_failures: u64,

    /// Records the sink refused
    pub sink_failures: u64,

    /// Whether the crawl was cut short by a timeout or shutdown signal
    pub cancelled: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Failed fetches of either kind
    pub fn fetch_failures(&self) -> u64 {
        self.listing_failures + self.detail_failures
    }

    /// Products that were summarized but produced no record
    pub fn skipped_products(&self) -> u64 {
        self.detail_failures + self.extraction_failures + self.sink_failures
    }

    /// True when anything was lost along the way
    pub fn is_degraded(&self) -> bool {
        self.cancelled
            || self.fetch_failures() > 0
            || self.extraction_failures > 0
            || self.sink_failures > 0
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Shared counters updated by crawl tasks
#[derive(Debug)]
pub struct CrawlCounters {
    listing_pages: AtomicU64,
    summaries: AtomicU64,
    records: AtomicU64,
    listing_failures: AtomicU64,
    detail_failures: AtomicU64,
    extraction_failures: AtomicU64,
    sink_failures: AtomicU64,
    cancelled: AtomicBool,
    started_at: DateTime<Utc>,
}

impl Default for CrawlCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self {
            listing_pages: AtomicU64::new(0),
            summaries: AtomicU64::new(0),
            records: AtomicU64::new(0),
            listing_failures: AtomicU64::new(0),
            detail_failures: AtomicU64::new(0),
            extraction_failures: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    pub fn listing_page(&self) {
        self.listing_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_summaries(&self, count: usize) {
        self.summaries.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn listing_failure(&self) {
        self.listing_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_failure(&self) {
        self.detail_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn extraction_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Freezes the counters into a report stamped with the current time
    pub fn snapshot(&self) -> CrawlReport {
        CrawlReport {
            listing_pages: self.listing_pages.load(Ordering::Relaxed),
            summaries: self.summaries.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            listing_failures: self.listing_failures.load(Ordering::Relaxed),
            detail_failures: self.detail_failures.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Prints a crawl report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Listing pages visited: {}", report.listing_pages);
    println!("  Products summarized: {}", report.summaries);
    println!("  Records written: {}", report.records);
    println!(
        "  Duration: {:.1}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    if report.is_degraded() {
        println!("Failures:");
        println!("  Listing page fetches: {}", report.listing_failures);
        println!("  Detail page fetches: {}", report.detail_failures);
        println!("  Missing attributes: {}", report.extraction_failures);
        println!("  Sink writes: {}", report.sink_failures);
        if report.cancelled {
            println!("  Crawl was cancelled before completion");
        }
        println!();
    }

    let success_rate = if report.summaries > 0 {
        (report.records as f64 / report.summaries as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} products written)",
        success_rate, report.records, report.summaries
    );
}
