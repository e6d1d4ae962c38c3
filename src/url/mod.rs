//! URL handling module for Catalog-Ripple
//!
//! Builds the per-page listing URLs from the start URL and resolves the
//! site-relative product links found on listing cards.

use url::Url;

/// Query parameter that selects a listing page
pub const PAGE_PARAM: &str = "page";

/// Builds the URL of listing page `page` from the category start URL
///
/// Any existing `page` selector on the start URL is replaced; all other query
/// parameters are kept in their original order.
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::listing_page_url;
/// use url::Url;
///
/// let start = Url::parse("https://shop.example/category/ice-cream").unwrap();
/// let page = listing_page_url(&start, 3);
/// assert_eq!(page.as_str(), "https://shop.example/category/ice-cream?page=3");
/// ```
pub fn listing_page_url(start_url: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = start_url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = start_url.clone();
    url.set_fragment(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        pairs.append_pair(PAGE_PARAM, &page.to_string());
    }
    url
}

/// Resolves a product card href against the listing page it was found on
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - anything that does not resolve to an HTTP(S) URL
pub fn resolve_detail_url(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute = page_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute)
}
