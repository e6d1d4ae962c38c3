//! Concurrency limits for the crawl
//!
//! Listing-page fetches and detail-page fetches form two independent groups,
//! each gated by its own semaphore. A permit covers one fetch only; extraction
//! and sink writes happen after the permit is released.

use crate::config::CrawlerConfig;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Which concurrency group a fetch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchGroup {
    Listing,
    Detail,
}

/// Semaphore pair bounding in-flight fetches per group
#[derive(Debug, Clone)]
pub struct FetchLimiter {
    listing: Arc<Semaphore>,
    detail: Arc<Semaphore>,
}

impl FetchLimiter {
    /// Creates a limiter with explicit ceilings (each at least 1)
    pub fn new(max_listing: usize, max_detail: usize) -> Self {
        Self {
            listing: Arc::new(Semaphore::new(max_listing.max(1))),
            detail: Arc::new(Semaphore::new(max_detail.max(1))),
        }
    }

    /// Creates a limiter from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_concurrent_listing_pages as usize,
            config.max_concurrent_detail_pages as usize,
        )
    }

    /// Waits for a free slot in `group`
    ///
    /// The permit is taken before the work it guards is launched, so at most
    /// the ceiling's worth of fetches exist per group at any time.
    pub async fn acquire(&self, group: FetchGroup) -> Option<OwnedSemaphorePermit> {
        self.semaphore(group).clone().acquire_owned().await.ok()
    }

    fn semaphore(&self, group: FetchGroup) -> &Arc<Semaphore> {
        match group {
            FetchGroup::Listing => &self.listing,
            FetchGroup::Detail => &self.detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(limiter: &FetchLimiter, group: FetchGroup) -> usize {
        limiter.semaphore(group).available_permits()
    }

    #[test]
    fn test_from_config() {
        let config = CrawlerConfig {
            max_concurrent_listing_pages: 3,
            max_concurrent_detail_pages: 7,
            ..CrawlerConfig::default()
        };
        let limiter = FetchLimiter::from_config(&config);

        assert_eq!(free(&limiter, FetchGroup::Listing), 3);
        assert_eq!(free(&limiter, FetchGroup::Detail), 7);
    }

    #[test]
    fn test_zero_ceiling_is_raised_to_one() {
        let limiter = FetchLimiter::new(0, 0);
        assert_eq!(free(&limiter, FetchGroup::Listing), 1);
        assert_eq!(free(&limiter, FetchGroup::Detail), 1);
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let limiter = FetchLimiter::new(1, 2);

        let _listing = limiter.acquire(FetchGroup::Listing).await.unwrap();
        assert_eq!(free(&limiter, FetchGroup::Listing), 0);

        let _detail = limiter.acquire(FetchGroup::Detail).await.unwrap();
        assert_eq!(free(&limiter, FetchGroup::Detail), 1);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let limiter = FetchLimiter::new(1, 1);
        {
            let _permit = limiter.acquire(FetchGroup::Detail).await.unwrap();
            assert_eq!(free(&limiter, FetchGroup::Detail), 0);
        }
        assert_eq!(free(&limiter, FetchGroup::Detail), 1);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let limiter = FetchLimiter::new(1, 1);
        let held = limiter.acquire(FetchGroup::Listing).await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire(FetchGroup::Listing).await.is_some() })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(held);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_ceilings() {
        let limiter = FetchLimiter::new(2, 2);
        let other = limiter.clone();

        let _permit = other.acquire(FetchGroup::Listing).await.unwrap();
        assert_eq!(free(&limiter, FetchGroup::Listing), 1);
    }
}
