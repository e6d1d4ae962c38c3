//! Output module for product records and crawl reports
//!
//! This module handles:
//! - The record sink interface the crawler writes to
//! - CSV and in-memory sink implementations
//! - Crawl statistics and the end-of-run report

mod csv_sink;
mod memory;
pub mod stats;
mod traits;

pub use csv_sink::{CsvSink, CSV_HEADER};
pub use memory::MemorySink;
pub use stats::{print_report, CrawlCounters, CrawlReport};
pub use traits::{RecordSink, SinkError, SinkResult};
