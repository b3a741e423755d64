use super::traits::PropertySource;
use super::types::{PageRequest, QueryResult};
use crate::config::ListingConfig;
use crate::filters::Filters;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Cache key of one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub page: u32,
    pub filters: Filters,
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub page_size: usize,
    /// How long a cached page is reused without fetching again.
    pub stale_time: Duration,
    /// Additional attempts after a failed fetch.
    pub retries: u32,
    pub retry_delay: Duration,
    /// How long a page nobody looks at stays in memory.
    pub cache_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: 12,
            stale_time: Duration::from_secs(60),
            retries: 0,
            retry_delay: Duration::from_secs(1),
            cache_time: Duration::from_secs(300),
        }
    }
}

impl From<&ListingConfig> for QueryOptions {
    fn from(config: &ListingConfig) -> Self {
        Self {
            page_size: config.page_size,
            stale_time: Duration::from_secs(config.stale_time_secs),
            retries: config.retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            cache_time: Duration::from_secs(config.cache_time_secs),
        }
    }
}

/// What the listing view should render for the current key.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub key: Option<QueryKey>,
    /// Results of the current key, or of the previously displayed key while
    /// the current one has never resolved (see `is_placeholder`).
    pub data: Option<Arc<QueryResult>>,
    pub is_placeholder: bool,
    /// Nothing to show yet and a fetch is running.
    pub is_loading: bool,
    pub is_fetching: bool,
    /// Last failure of the current key.
    pub error: Option<Arc<anyhow::Error>>,
}

#[derive(Default)]
struct CacheEntry {
    result: Option<Arc<QueryResult>>,
    fetched_at: Option<Instant>,
    error: Option<Arc<anyhow::Error>>,
    in_flight: bool,
    last_used: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        self.fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < stale_time)
    }

    fn is_unused(&self, cache_time: Duration) -> bool {
        !self.in_flight
            && self
                .last_used
                .map_or(true, |last_used| last_used.elapsed() >= cache_time)
    }
}

#[derive(Default)]
struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    current: Option<QueryKey>,
    displayed: Option<Arc<QueryResult>>,
}

impl QueryCache {
    /// Drops entries that are neither current, in flight nor recently used.
    fn evict(&mut self, cache_time: Duration) {
        let before = self.entries.len();
        let current = self.current.as_ref();
        self.entries
            .retain(|key, entry| Some(key) == current || !entry.is_unused(cache_time));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted unused pages");
        }
    }

    fn state(&mut self) -> QueryState {
        let Some(key) = self.current.clone() else {
            return QueryState::default();
        };
        let entry = self.entries.get(&key);
        let is_fetching = entry.is_some_and(|entry| entry.in_flight);
        let error = entry.and_then(|entry| entry.error.clone());

        let (data, is_placeholder) = match entry.and_then(|entry| entry.result.clone()) {
            Some(result) => {
                self.displayed = Some(result.clone());
                (Some(result), false)
            }
            None => (self.displayed.clone(), self.displayed.is_some()),
        };

        QueryState {
            key: Some(key),
            is_loading: data.is_none() && is_fetching,
            data,
            is_placeholder,
            is_fetching,
            error,
        }
    }
}

/// Paginated property query with a per-key result cache.
///
/// Responses always land in the entry of the key they were requested for,
/// and [`PropertyQuery::state`] always renders the current key, so a slow
/// response for an abandoned key can never replace newer results.
pub struct PropertyQuery {
    source: Arc<dyn PropertySource>,
    options: QueryOptions,
    cache: Mutex<QueryCache>,
}

impl PropertyQuery {
    pub fn new(source: Arc<dyn PropertySource>, options: QueryOptions) -> Self {
        Self {
            source,
            options,
            cache: Mutex::new(QueryCache::default()),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Makes `(page, filters)` the current key. Returns the key when its
    /// cached entry is missing or stale and no fetch for it is running; the
    /// caller then owes a [`PropertyQuery::fetch`] for it.
    pub fn select(&self, page: u32, filters: Filters) -> Option<QueryKey> {
        let key = QueryKey { page, filters };
        let mut guard = self.cache.lock();
        let cache = &mut *guard;

        // Whatever the previous key shows stays up until the new key resolves.
        if let Some(shown) = cache
            .current
            .as_ref()
            .and_then(|current| cache.entries.get(current))
            .and_then(|entry| entry.result.clone())
        {
            cache.displayed = Some(shown);
        }
        cache.current = Some(key.clone());
        cache.evict(self.options.cache_time);

        let entry = cache.entries.entry(key.clone()).or_default();
        entry.last_used = Some(Instant::now());
        if entry.in_flight || entry.is_fresh(self.options.stale_time) {
            debug!(page, "Reusing cached page");
            return None;
        }
        entry.in_flight = true;
        Some(key)
    }

    /// Fetches the page for `key` and stores the outcome in its cache entry.
    pub async fn fetch(&self, key: QueryKey) {
        let request = PageRequest {
            page: key.page,
            limit: self.options.page_size,
            filters: key.filters.clone(),
        };
        let in_flight = InFlight {
            cache: &self.cache,
            key: Some(key.clone()),
        };
        let outcome = self.fetch_with_retries(&request).await;
        in_flight.finish();

        let mut guard = self.cache.lock();
        let cache = &mut *guard;
        let is_current = cache.current.as_ref() == Some(&key);
        let entry = cache.entries.entry(key).or_default();
        entry.last_used = Some(Instant::now());
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                entry.result = Some(result.clone());
                entry.fetched_at = Some(Instant::now());
                entry.error = None;
                if is_current {
                    cache.displayed = Some(result);
                }
            }
            Err(err) => {
                entry.error = Some(Arc::new(err));
            }
        }
    }

    /// Selects the key, fetches it when needed and returns the resulting state.
    pub async fn load(&self, page: u32, filters: Filters) -> QueryState {
        if let Some(key) = self.select(page, filters) {
            self.fetch(key).await;
        }
        self.state()
    }

    pub fn state(&self) -> QueryState {
        self.cache.lock().state()
    }

    /// Number of pages held in the cache, current one included.
    pub fn cached_pages(&self) -> usize {
        self.cache.lock().entries.len()
    }

    /// Marks every cached page as stale.
    pub fn invalidate(&self) {
        for entry in self.cache.lock().entries.values_mut() {
            entry.fetched_at = None;
        }
    }

    async fn fetch_with_retries(&self, request: &PageRequest) -> anyhow::Result<QueryResult> {
        let mut attempt = 0;
        loop {
            match self.source.fetch_page(request).await {
                Ok(result) => {
                    info!(
                        source = self.source.source_name(),
                        page = request.page,
                        total = result.total,
                        "Fetched listings page"
                    );
                    return Ok(result);
                }
                Err(err) if attempt < self.options.retries => {
                    attempt += 1;
                    warn!(
                        source = self.source.source_name(),
                        page = request.page,
                        attempt,
                        "Listings fetch failed, retrying: {err:#}"
                    );
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                Err(err) => {
                    warn!(
                        source = self.source.source_name(),
                        page = request.page,
                        "Listings fetch failed: {err:#}"
                    );
                    return Err(err);
                }
            }
        }
    }
}

/// Clears the in-flight mark of a key when its fetch ends, including when the
/// fetch is cancelled mid-way, so the key can be fetched again.
struct InFlight<'a> {
    cache: &'a Mutex<QueryCache>,
    key: Option<QueryKey>,
}

impl InFlight<'_> {
    fn finish(mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        if let Some(key) = self.key.take() {
            if let Some(entry) = self.cache.lock().entries.get_mut(&key) {
                entry.in_flight = false;
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{PropertyQuery, QueryOptions};
    use crate::filters::{FilterSnapshot, Filters};
    use crate::listings::{MockPropertySource, PageRequest, PropertySource, QueryResult};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Wraps the mock backend, counting calls and optionally failing them.
    pub(crate) struct RecordingSource {
        inner: MockPropertySource,
        pub calls: AtomicUsize,
        pub failing: AtomicBool,
        /// Extra latency for page 1, to reorder responses.
        first_page_delay: Duration,
    }

    impl RecordingSource {
        pub(crate) fn new(latency: Duration) -> Self {
            Self {
                inner: MockPropertySource::new(latency),
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                first_page_delay: Duration::ZERO,
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PropertySource for RecordingSource {
        async fn fetch_page(&self, request: &PageRequest) -> Result<QueryResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.page == 1 && !self.first_page_delay.is_zero() {
                tokio::time::sleep(self.first_page_delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                bail!("backend unavailable");
            }
            self.inner.fetch_page(request).await
        }

        fn source_name(&self) -> &'static str {
            "Recording"
        }
    }

    fn options(page_size: usize) -> QueryOptions {
        QueryOptions {
            page_size,
            ..QueryOptions::default()
        }
    }

    fn filters(query: &str) -> Filters {
        FilterSnapshot::from_query_string(query).filters
    }

    #[tokio::test(start_paused = true)]
    async fn reuses_fresh_pages_and_refetches_stale_ones() {
        let source = Arc::new(RecordingSource::new(Duration::ZERO));
        let query = PropertyQuery::new(source.clone(), options(4));

        let first = query.load(1, filters("status=for_sale")).await;
        assert_eq!(first.data.as_ref().map(|data| data.total), Some(10));
        query.load(1, filters("status=for_sale")).await;
        assert_eq!(source.calls(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        query.load(1, filters("status=for_sale")).await;
        assert_eq!(source.calls(), 2);

        query.invalidate();
        query.load(1, filters("status=for_sale")).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_previous_results_visible_while_the_next_key_loads() {
        let source = Arc::new(RecordingSource::new(Duration::from_millis(300)));
        let query = Arc::new(PropertyQuery::new(source.clone(), options(4)));

        let initial = query.select(1, Filters::default()).unwrap();
        let state = query.state();
        assert!(state.is_loading);
        assert!(state.data.is_none());
        query.fetch(initial).await;

        let next = query.select(2, Filters::default()).unwrap();
        let state = query.state();
        assert!(!state.is_loading);
        assert!(state.is_fetching);
        assert!(state.is_placeholder);
        assert_eq!(state.data.as_ref().map(|data| data.items.len()), Some(4));

        query.fetch(next).await;
        let state = query.state();
        assert!(!state.is_placeholder);
        assert!(!state.is_fetching);
        assert_eq!(state.key.map(|key| key.page), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn late_responses_for_abandoned_keys_are_not_rendered() {
        let source = Arc::new(RecordingSource {
            first_page_delay: Duration::from_secs(2),
            ..RecordingSource::new(Duration::from_millis(100))
        });
        let query = Arc::new(PropertyQuery::new(source.clone(), options(4)));

        let slow = query.select(1, Filters::default()).unwrap();
        let slow_fetch = tokio::spawn({
            let query = query.clone();
            async move { query.fetch(slow).await }
        });
        let fast = query.select(2, Filters::default()).unwrap();
        query.fetch(fast).await;
        slow_fetch.await.unwrap();

        let state = query.state();
        assert_eq!(state.key.as_ref().map(|key| key.page), Some(2));
        assert!(!state.is_placeholder);

        // The slow page was still cached and is served without a new fetch.
        assert!(query.select(1, Filters::default()).is_none());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failures_surface_as_errors_without_dropping_shown_results() {
        let source = Arc::new(RecordingSource::new(Duration::ZERO));
        let query = PropertyQuery::new(source.clone(), options(4));
        query.load(1, Filters::default()).await;

        source.failing.store(true, Ordering::SeqCst);
        let state = query.load(1, filters("beds=3")).await;
        assert!(state.error.is_some());
        assert!(state.is_placeholder);
        assert!(!state.is_loading);
        assert!(state.data.is_some());

        // Repeating the action retries the failed key.
        source.failing.store(false, Ordering::SeqCst);
        let state = query.load(1, filters("beds=3")).await;
        assert!(state.error.is_none());
        assert!(!state.is_placeholder);
    }

    #[tokio::test(start_paused = true)]
    async fn unused_pages_are_evicted_after_the_cache_time() {
        let source = Arc::new(RecordingSource::new(Duration::ZERO));
        let query = PropertyQuery::new(source.clone(), options(4));

        query.load(1, Filters::default()).await;
        query.load(2, Filters::default()).await;
        query.load(3, Filters::default()).await;
        assert_eq!(query.cached_pages(), 3);

        tokio::time::advance(Duration::from_secs(120)).await;
        query.load(2, Filters::default()).await;
        assert_eq!(query.cached_pages(), 3);

        // Pages 1 and 3 have not been looked at for 300s, page 2 only for 180s.
        tokio::time::advance(Duration::from_secs(180)).await;
        let state = query.load(4, Filters::default()).await;
        assert_eq!(query.cached_pages(), 2);
        assert!(state.data.is_some());

        let calls = source.calls();
        query.load(1, Filters::default()).await;
        assert_eq!(source.calls(), calls + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetches_leave_the_key_fetchable() {
        let source = Arc::new(RecordingSource::new(Duration::from_millis(300)));
        let query = Arc::new(PropertyQuery::new(source.clone(), options(4)));

        let key = query.select(1, Filters::default()).unwrap();
        let pending = tokio::spawn({
            let query = query.clone();
            async move { query.fetch(key).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        assert!(!query.state().is_fetching);

        let state = query.load(1, Filters::default()).await;
        assert_eq!(source.calls(), 2);
        assert!(state.data.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded_by_the_options() {
        let source = Arc::new(RecordingSource::new(Duration::ZERO));
        source.failing.store(true, Ordering::SeqCst);
        let query = PropertyQuery::new(
            source.clone(),
            QueryOptions {
                retries: 2,
                ..options(4)
            },
        );

        let state = query.load(1, Filters::default()).await;
        assert!(state.error.is_some());
        assert!(state.data.is_none());
        assert_eq!(source.calls(), 3);
    }
}
