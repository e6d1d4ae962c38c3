//! Product data model
//!
//! The values that flow through a crawl: the pagination set discovered on the
//! first listing page, the summaries read off listing cards, the attributes
//! read off detail pages, and the merged records handed to the sink.

mod price;

pub use price::scrub_price;

use url::Url;

/// Page numbers of a paginated listing, always `1..=N`
///
/// Empty when the listing has no pagination control, in which case the start
/// URL is the only listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationSet {
    last_page: u32,
}

impl PaginationSet {
    /// A set holding pages `1..=last_page`; `0` yields the empty set
    pub fn up_to(last_page: u32) -> Self {
        Self { last_page }
    }

    /// The empty set (single-page listing)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.last_page == 0
    }

    pub fn len(&self) -> usize {
        self.last_page as usize
    }

    /// Highest page number, if any
    pub fn last_page(&self) -> Option<u32> {
        (self.last_page > 0).then_some(self.last_page)
    }

    /// Iterates the page numbers in ascending order
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        1..=self.last_page
    }
}

/// A product card read from a listing page
///
/// Only in-stock cards ever become summaries; the extractor drops the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    /// Absolute URL of the product detail page
    pub detail_url: Url,

    /// Current price, digits and `.` only (may be empty)
    pub current_price: String,

    /// Price before discount, digits and `.` only (may be empty)
    pub previous_price: String,

    pub in_stock: bool,
}

/// Canonical attributes read from a product detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAttributes {
    pub id: String,
    pub name: String,
    pub brand: String,
}

/// A complete product row
///
/// Built only from a summary plus the attributes of its detail page, so a
/// record is never half-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub current_price: String,
    pub previous_price: String,
    pub url: String,
}

impl ProductRecord {
    /// Merges listing-side price data with detail-side attributes
    pub fn merge(summary: ProductSummary, attributes: ProductAttributes) -> Self {
        Self {
            id: attributes.id,
            name: attributes.name,
            brand: attributes.brand,
            current_price: summary.current_price,
            previous_price: summary.previous_price,
            url: summary.detail_url.into(),
        }
    }

    /// Fields in output column order
    pub fn as_row(&self) -> [&str; 6] {
        [
            &self.id,
            &self.name,
            &self.brand,
            &self.current_price,
            &self.previous_price,
            &self.url,
        ]
    }
}
