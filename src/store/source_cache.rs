// src/store/source_cache.rs

//! Per-source refresh gating.
//!
//! Wraps one fetcher with a TTL and a single-flight guarantee: at most one
//! caller performs the network round-trip per elapsed TTL window, everyone
//! else observes "nothing refreshed" without waiting.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::FetchResult;
use crate::models::Proxy;

/// The fetch contract a source implements.
///
/// A fetcher returns the full set of proxies currently advertised by its
/// upstream, or a [`FetchError`](crate::error::FetchError) when the upstream
/// is unavailable or its payload does not parse. Fetchers are expected to
/// enforce their own network timeout via their HTTP client.
#[async_trait]
pub trait ProxyFetcher: Send + Sync {
    async fn fetch(&self) -> FetchResult<HashSet<Proxy>>;
}

/// TTL and single-flight gate in front of one fetcher.
pub struct SourceCache {
    name: String,
    fetcher: Arc<dyn ProxyFetcher>,
    ttl: Duration,
    fetch_timeout: Option<Duration>,
    /// Monotonic timestamp of the last *successful* fetch.
    last_refresh: Mutex<Option<Instant>>,
    /// Held by the one caller currently fetching.
    flight: tokio::sync::Mutex<()>,
}

impl SourceCache {
    pub fn new(name: impl Into<String>, fetcher: Arc<dyn ProxyFetcher>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            fetcher,
            ttl,
            fetch_timeout: None,
            last_refresh: Mutex::new(None),
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Bound the worst-case duration of one fetch. A timed-out fetch is
    /// treated like any other transient failure.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_fresh(&self) -> bool {
        self.last_refresh
            .lock()
            .is_some_and(|at| at.elapsed() < self.ttl)
    }

    /// Attempt a refresh.
    ///
    /// Returns the freshly fetched set when this caller actually refreshed,
    /// `None` otherwise. `None` covers three indistinguishable cases: the
    /// TTL has not elapsed, another caller holds the fetch in flight, or
    /// the fetch failed. A failed fetch does not advance the TTL clock, so
    /// a source that last succeeded at `T` is not re-attempted before
    /// `T + ttl` no matter how many failures happen in between.
    pub async fn refresh(&self, force: bool) -> Option<HashSet<Proxy>> {
        if !force && self.is_fresh() {
            return None;
        }

        // Single flight: whoever holds the guard does the round-trip.
        // Losers return immediately rather than queueing behind it.
        let Ok(_flight) = self.flight.try_lock() else {
            log::debug!("source {}: refresh already in flight", self.name);
            return None;
        };

        // Re-check under the guard; a concurrent winner may have just
        // refreshed between our fast-path check and the lock.
        if !force && self.is_fresh() {
            return None;
        }

        match self.fetch_bounded().await {
            Ok(proxies) => {
                *self.last_refresh.lock() = Some(Instant::now());
                log::debug!("source {}: fetched {} proxies", self.name, proxies.len());
                Some(proxies)
            }
            Err(e) => {
                log::warn!("source {}: refresh failed: {}", self.name, e);
                None
            }
        }
    }

    async fn fetch_bounded(&self) -> FetchResult<HashSet<Proxy>> {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch())
                .await
                .unwrap_or_else(|_| {
                    Err(crate::error::FetchError::unavailable(format!(
                        "fetch exceeded {}s",
                        limit.as_secs()
                    )))
                }),
            None => self.fetcher.fetch().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockFetcher {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Option<Duration>,
        proxies: HashSet<Proxy>,
    }

    impl MockFetcher {
        fn new() -> Self {
            let mut proxies = HashSet::new();
            proxies.insert(Proxy::new("10.0.0.1", "8080", "mock"));
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: None,
                proxies,
            }
        }

        fn failing() -> Self {
            let fetcher = Self::new();
            fetcher.fail.store(true, Ordering::SeqCst);
            fetcher
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProxyFetcher for MockFetcher {
        async fn fetch(&self) -> FetchResult<HashSet<Proxy>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                Err(FetchError::unavailable("scripted failure"))
            } else {
                Ok(self.proxies.clone())
            }
        }
    }

    fn cache_with(fetcher: Arc<MockFetcher>, ttl: Duration) -> SourceCache {
        SourceCache::new("mock", fetcher, ttl)
    }

    #[tokio::test]
    async fn ttl_gates_second_refresh() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = cache_with(Arc::clone(&fetcher), Duration::from_secs(3600));

        assert!(cache.refresh(false).await.is_some());
        assert!(cache.refresh(false).await.is_none());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn force_overrides_ttl() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = cache_with(Arc::clone(&fetcher), Duration::from_secs(3600));

        assert!(cache.refresh(false).await.is_some());
        assert!(cache.refresh(true).await.is_some());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn failure_does_not_consume_ttl() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = cache_with(Arc::clone(&fetcher), Duration::from_secs(3600));

        // Establish a successful refresh, then make the upstream die.
        assert!(cache.refresh(false).await.is_some());
        fetcher.fail.store(true, Ordering::SeqCst);

        // The forced attempt fails and must not advance the clock.
        assert!(cache.refresh(true).await.is_none());
        assert_eq!(fetcher.calls(), 2);

        // Still inside the window of the original success: no new attempt.
        assert!(cache.refresh(false).await.is_none());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn never_succeeded_source_is_retried() {
        let fetcher = Arc::new(MockFetcher::failing());
        let cache = cache_with(Arc::clone(&fetcher), Duration::from_secs(3600));

        assert!(cache.refresh(false).await.is_none());
        assert!(cache.refresh(false).await.is_none());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn empty_fetch_counts_as_refresh() {
        let fetcher = Arc::new(MockFetcher {
            proxies: HashSet::new(),
            ..MockFetcher::new()
        });
        let cache = cache_with(Arc::clone(&fetcher), Duration::from_secs(3600));

        let refreshed = cache.refresh(false).await;
        assert_eq!(refreshed, Some(HashSet::new()));
        assert!(cache.refresh(false).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_callers_fetch_once() {
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_millis(200)));
        let cache = Arc::new(cache_with(Arc::clone(&fetcher), Duration::from_secs(3600)));

        let a = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.refresh(false).await }
        });
        let b = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.refresh(false).await }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(fetcher.calls(), 1);
        // Exactly one of the two callers won the flight.
        assert!(a.is_some() ^ b.is_some());
    }

    #[tokio::test]
    async fn loser_returns_without_waiting_for_winner() {
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_secs(5)));
        let cache = Arc::new(cache_with(Arc::clone(&fetcher), Duration::from_secs(3600)));

        let winner = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.refresh(false).await }
        });
        // Let the winner enter its fetch.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        assert!(cache.refresh(false).await.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));

        winner.abort();
    }

    #[tokio::test]
    async fn fetch_timeout_is_a_transient_failure() {
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_secs(5)));
        let cache = cache_with(Arc::clone(&fetcher), Duration::from_secs(3600))
            .with_fetch_timeout(Duration::from_millis(50));

        assert!(cache.refresh(false).await.is_none());
        // The clock did not advance, so a later attempt fetches again.
        assert!(cache.refresh(false).await.is_none());
        assert_eq!(fetcher.calls(), 2);
    }
}
