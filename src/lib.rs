//! Catalog-Ripple: a concurrent product catalog harvester
//!
//! This crate crawls a paginated e-commerce category listing, follows its
//! pagination, visits every in-stock product's detail page concurrently and
//! hands the merged product records to a record sink (CSV by default).

pub mod config;
pub mod crawler;
pub mod output;
pub mod product;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to fetch start page {url}: {source}")]
    StartPage {
        url: String,
        source: crawler::FetchError,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use output::{CsvSink, MemorySink, RecordSink};
pub use product::{PaginationSet, ProductAttributes, ProductRecord, ProductSummary};
