use super::params::{FilterField, FilterValue, QueryParams, PAGE_KEY};
use super::snapshot::{read_page, FilterSnapshot, Filters};
use tokio::sync::watch;
use tracing::debug;

/// Where the serialized filter state lives, e.g. the browser URL.
pub trait Location {
    /// Current query string, without the leading `?`.
    fn query(&self) -> String;

    /// Replaces the query of the current history entry without adding a new one.
    fn replace_query(&mut self, query: String);
}

/// In-memory navigation history.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial_query: impl Into<String>) -> Self {
        Self {
            entries: vec![initial_query.into()],
            index: 0,
        }
    }

    /// Navigates to a new entry, discarding any forward entries.
    pub fn push(&mut self, query: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(query.into());
        self.index = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Number of history entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl Location for MemoryHistory {
    fn query(&self) -> String {
        self.entries[self.index].clone()
    }

    fn replace_query(&mut self, query: String) {
        self.entries[self.index] = query;
    }
}

/// Single source of truth for the search filters, backed by a [`Location`].
///
/// Nothing is cached: every read parses the location again, and every write
/// goes straight back to it. Subscribers are notified whenever the resulting
/// snapshot changes.
pub struct FilterStore<L = MemoryHistory> {
    location: L,
    updates: watch::Sender<FilterSnapshot>,
}

impl<L: Location> FilterStore<L> {
    pub fn new(location: L) -> Self {
        let snapshot = FilterSnapshot::from_query_string(&location.query());
        let (updates, _) = watch::channel(snapshot);
        Self { location, updates }
    }

    pub fn params(&self) -> QueryParams {
        QueryParams::parse(&self.location.query())
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot::from_params(&self.params())
    }

    pub fn filters(&self) -> Filters {
        Filters::from_params(&self.params())
    }

    pub fn page(&self) -> u32 {
        read_page(&self.params())
    }

    /// Writes a single filter. Default values remove the key, and the page
    /// always goes back to the first one.
    pub fn set_filter(&mut self, field: FilterField, value: impl Into<FilterValue>) {
        let mut params = self.params();
        match field.normalize(value.into()) {
            Some(value) => {
                debug!(field = field.key(), value = %value, "Setting filter");
                params.set(field.key(), value);
            }
            None => {
                debug!(field = field.key(), "Clearing filter");
                params.remove(field.key());
            }
        }
        params.remove(PAGE_KEY);
        self.commit(params);
    }

    /// Writes only the page; the first page is stored as an absent key.
    pub fn set_page(&mut self, page: u32) {
        let mut params = self.params();
        if page > 1 {
            params.set(PAGE_KEY, page.to_string());
        } else {
            params.remove(PAGE_KEY);
        }
        self.commit(params);
    }

    /// Clears every query parameter.
    pub fn reset_filters(&mut self) {
        debug!("Resetting filters");
        self.commit(QueryParams::new());
    }

    /// Runs an external navigation (back/forward, link click) against the
    /// location and publishes the snapshot it leads to.
    pub fn navigate<R>(&mut self, navigation: impl FnOnce(&mut L) -> R) -> R {
        let result = navigation(&mut self.location);
        self.publish();
        result
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.updates.subscribe()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    fn commit(&mut self, params: QueryParams) {
        self.location.replace_query(params.to_query_string());
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

impl Default for FilterStore<MemoryHistory> {
    fn default() -> Self {
        Self::new(MemoryHistory::default())
    }
}
