//! Markup extraction for listing and product pages
//!
//! Three read-only queries answered against already fetched markup:
//! - the pagination set of a listing page
//! - the in-stock product summaries of a listing page
//! - the canonical attributes (id, name, brand) of a product page
//!
//! None of them touch the network or shared state.

use crate::product::{scrub_price, PaginationSet, ProductAttributes, ProductSummary};
use crate::url::resolve_detail_url;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Largest last-page number accepted from a pagination control
pub const MAX_LISTING_PAGES: u32 = 10_000;

/// Required product attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Id,
    Name,
    Brand,
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "product id",
            Self::Name => "product name",
            Self::Brand => "brand",
        })
    }
}

/// Errors raised while extracting product attributes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Missing required field: {0}")]
    MissingField(ProductField),
}

/// Queries the crawler asks of fetched markup
///
/// Implementations are pure functions of the markup they are given.
pub trait MarkupExtractor: Send + Sync {
    /// Page numbers advertised by the listing's pagination control
    ///
    /// Absent or malformed controls yield the empty set.
    fn pagination(&self, markup: &str) -> PaginationSet;

    /// In-stock product cards of a listing page
    ///
    /// Out-of-stock cards and cards without a usable detail link are omitted.
    fn summaries(&self, markup: &str, page_url: &Url) -> Vec<ProductSummary>;

    /// Canonical attributes of a product detail page
    fn attributes(&self, markup: &str) -> Result<ProductAttributes, ExtractError>;
}

/// CSS selectors matching the metro-cc.ru category and product markup
#[derive(Debug, Clone)]
struct Selectors {
    pagination: Selector,
    pagination_item: Selector,
    card: Selector,
    out_of_stock: Selector,
    detail_link: Selector,
    current_price: Selector,
    previous_price: Selector,
    product_id: Selector,
    product_name: Selector,
    brand: Selector,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            pagination: selector("ul.catalog-paginate.v-pagination"),
            pagination_item: selector("li"),
            card: selector("div.product-card__content"),
            out_of_stock: selector(r#"p[is-out-of-stock="true"]"#),
            detail_link: selector(r#"a[data-qa="product-card-photo-link"]"#),
            current_price: selector("span.product-card-prices__actual"),
            previous_price: selector("span.product-card-prices__old"),
            product_id: selector(r#"p[itemprop="productID"]"#),
            product_name: selector("h1.product-page-content__product-name"),
            brand: selector(
                "ul.product-attributes__list.style--product-page-full-list \
                 span.product-attributes__list-item-value",
            ),
        }
    }
}

// Built-in selector strings are covered by `test_builtin_selectors_parse`
fn selector(css: &str) -> Selector {
    match Selector::parse(css) {
        Ok(selector) => selector,
        Err(e) => panic!("invalid built-in selector {css:?}: {e:?}"),
    }
}

/// Extractor for the category listing and product page markup
#[derive(Debug, Clone, Default)]
pub struct CatalogExtractor {
    selectors: Selectors,
}

impl CatalogExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_card(&self, card: ElementRef<'_>, page_url: &Url) -> Option<ProductSummary> {
        let href = card
            .select(&self.selectors.detail_link)
            .next()
            .and_then(|link| link.value().attr("href"));

        let Some(href) = href else {
            tracing::debug!("Skipping product card without detail link on {}", page_url);
            return None;
        };

        let Some(detail_url) = resolve_detail_url(href, page_url) else {
            tracing::debug!("Skipping product card with unusable href {:?}", href);
            return None;
        };

        Some(ProductSummary {
            detail_url,
            current_price: price_text(card, &self.selectors.current_price),
            previous_price: price_text(card, &self.selectors.previous_price),
            in_stock: true,
        })
    }
}

impl MarkupExtractor for CatalogExtractor {
    fn pagination(&self, markup: &str) -> PaginationSet {
        let document = Html::parse_document(markup);

        let Some(control) = document.select(&self.selectors.pagination).next() else {
            return PaginationSet::empty();
        };

        // The last item is the "next" arrow; the one before it holds the last page
        let items: Vec<ElementRef<'_>> = control.select(&self.selectors.pagination_item).collect();
        if items.len() < 2 {
            tracing::debug!("Pagination control has {} items, ignoring", items.len());
            return PaginationSet::empty();
        }

        let text = element_text(items[items.len() - 2]);
        match text.parse::<u32>() {
            Ok(last_page) if last_page <= MAX_LISTING_PAGES => PaginationSet::up_to(last_page),
            Ok(last_page) => {
                tracing::warn!(
                    "Pagination claims {} pages (limit {}), ignoring pagination",
                    last_page,
                    MAX_LISTING_PAGES
                );
                PaginationSet::empty()
            }
            Err(_) => {
                tracing::debug!("Malformed last page number {:?}, ignoring pagination", text);
                PaginationSet::empty()
            }
        }
    }

    fn summaries(&self, markup: &str, page_url: &Url) -> Vec<ProductSummary> {
        let document = Html::parse_document(markup);

        document
            .select(&self.selectors.card)
            .filter(|card| card.select(&self.selectors.out_of_stock).next().is_none())
            .filter_map(|card| self.parse_card(card, page_url))
            .collect()
    }

    fn attributes(&self, markup: &str) -> Result<ProductAttributes, ExtractError> {
        let document = Html::parse_document(markup);

        let required = |selector: &Selector, field: ProductField| {
            document
                .select(selector)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())
                .ok_or(ExtractError::MissingField(field))
        };

        Ok(ProductAttributes {
            id: required(&self.selectors.product_id, ProductField::Id)?,
            name: required(&self.selectors.product_name, ProductField::Name)?,
            brand: required(&self.selectors.brand, ProductField::Brand)?,
        })
    }
}

/// Trimmed text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Scrubbed price inside a card; absent element yields an empty string
fn price_text(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|element| scrub_price(&element.text().collect::<String>()))
        .unwrap_or_default()
}
