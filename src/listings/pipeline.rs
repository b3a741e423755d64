use super::query::{PropertyQuery, QueryState};
use crate::debounce::debounce;
use crate::filters::{FilterSnapshot, Filters};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::debug;

/// Drives the listing view: filter snapshots in, query states out.
///
/// Filter changes are debounced as a whole. Page changes fetch at once unless
/// they come with a filter change, which then carries the page along. Fetches
/// run concurrently with further changes and their results are published
/// for whatever key is current when they finish.
pub struct ListingPipeline {
    states: watch::Receiver<QueryState>,
    driver: JoinHandle<()>,
}

impl ListingPipeline {
    pub fn spawn(
        mut snapshots: watch::Receiver<FilterSnapshot>,
        query: Arc<PropertyQuery>,
        delay: Duration,
    ) -> Self {
        let initial = snapshots.borrow_and_update().clone();
        let (filters_tx, filters_rx) = watch::channel(initial.filters.clone());
        let (states_tx, states) = watch::channel(query.state());

        let driver = tokio::spawn(async move {
            let mut debounced = debounce(filters_rx, delay);
            let mut fetches = JoinSet::new();
            let mut page = initial.page;
            let mut filters = initial.filters;
            // A page change that arrived together with unsettled filters.
            let mut page_pending = false;

            request(&query, &states_tx, &mut fetches, page, filters.clone());
            loop {
                tokio::select! {
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = snapshots.borrow_and_update().clone();
                        filters_tx.send_if_modified(|current| {
                            if *current == snapshot.filters {
                                return false;
                            }
                            *current = snapshot.filters.clone();
                            true
                        });
                        if snapshot.page != page {
                            page = snapshot.page;
                            page_pending = true;
                        }
                        // Filter writes reset the page; that page waits for the
                        // debounced filters instead of fetching the old ones.
                        if page_pending && snapshot.filters == filters {
                            page_pending = false;
                            request(&query, &states_tx, &mut fetches, page, filters.clone());
                        }
                    }
                    changed = debounced.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        filters = debounced.borrow_and_update().clone();
                        page_pending = false;
                        request(&query, &states_tx, &mut fetches, page, filters.clone());
                    }
                    Some(_) = fetches.join_next(), if !fetches.is_empty() => {
                        states_tx.send_replace(query.state());
                    }
                }
            }

            // Let fetches already in flight populate the cache.
            while fetches.join_next().await.is_some() {
                states_tx.send_replace(query.state());
            }
        });

        Self { states, driver }
    }

    pub fn state(&self) -> QueryState {
        self.states.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.states.clone()
    }
}

fn request(
    query: &Arc<PropertyQuery>,
    states: &watch::Sender<QueryState>,
    fetches: &mut JoinSet<()>,
    page: u32,
    filters: Filters,
) {
    debug!(page, "Listing key changed");
    if let Some(key) = query.select(page, filters) {
        let query = query.clone();
        fetches.spawn(async move { query.fetch(key).await });
    }
    states.send_replace(query.state());
}

impl Drop for ListingPipeline {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
