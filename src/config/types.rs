use serde::Deserialize;

/// Category crawled when neither the CLI nor the config names one
pub const DEFAULT_START_URL: &str =
    "https://online.metro-cc.ru/category/molochnye-prodkuty-syry-i-yayca/morozhenoe";

/// Main configuration structure for Catalog-Ripple
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Category listing page the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum number of listing pages fetched at once
    #[serde(rename = "max-concurrent-listing-pages")]
    pub max_concurrent_listing_pages: u32,

    /// Maximum number of product detail pages fetched at once
    #[serde(rename = "max-concurrent-detail-pages")]
    pub max_concurrent_detail_pages: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Whole-crawl timeout (seconds), 0 disables it
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            max_concurrent_listing_pages: 4,
            max_concurrent_detail_pages: 16,
            request_timeout_secs: 30,
            crawl_timeout_secs: 0,
        }
    }
}

/// Store identity sent as cookies with every request of a crawl
///
/// Prices on the site depend on the pickup location, so the same pair is used
/// for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Value of the `pickupStore` cookie
    #[serde(rename = "pickup-store")]
    pub pickup_store: String,

    /// Value of the `metroStoreId` cookie
    #[serde(rename = "store-id")]
    pub store_id: String,
}

impl Default for SessionConfig {
    // Moscow, Prospekt Mira 211
    fn default() -> Self {
        Self {
            pickup_store: "11".to_string(),
            store_id: "11".to_string(),
        }
    }
}

impl SessionConfig {
    /// The `Cookie` header value carrying the store identity
    pub fn cookie_header(&self) -> String {
        format!(
            "pickupStore={}; metroStoreId={}",
            self.pickup_store, self.store_id
        )
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "CatalogRipple".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the CSV file receiving product records
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "products.csv".to_string(),
        }
    }
}
