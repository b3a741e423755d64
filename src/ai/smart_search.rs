use super::patch::FilterPatch;
use super::schema::ParseSchema;
use super::traits::QueryParser;
use crate::error::SmartSearchError;
use crate::filters::{FilterField, FilterStore, Location};
use crate::models::Catalog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Natural-language search on top of a [`QueryParser`].
///
/// [`SmartSearch::search`] runs the whole flow against a store. Callers that
/// cannot lend the store for the duration of the model call use
/// [`SmartSearch::parse`] and apply the patch themselves.
pub struct SmartSearch {
    parser: Arc<dyn QueryParser>,
    schema: ParseSchema,
    timeout: Duration,
    loading: AtomicBool,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SmartSearch {
    pub fn new(parser: Arc<dyn QueryParser>, catalog: &Catalog, timeout: Duration) -> Self {
        Self {
            parser,
            schema: ParseSchema::from_catalog(catalog),
            timeout,
            loading: AtomicBool::new(false),
        }
    }

    /// Whether a model call is in progress.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn schema(&self) -> &ParseSchema {
        &self.schema
    }

    /// Stores the raw text in `q`, then merges the parsed filters. On failure
    /// only `q` has changed.
    pub async fn search<L: Location>(
        &self,
        store: &mut FilterStore<L>,
        text: &str,
    ) -> Result<FilterPatch, SmartSearchError> {
        store.set_filter(FilterField::Query, text);
        let patch = self.parse(text).await?;
        patch.apply(store);
        Ok(patch)
    }

    /// Turns free text into a validated patch. No filter is touched here.
    pub async fn parse(&self, text: &str) -> Result<FilterPatch, SmartSearchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SmartSearchError::EmptyQuery);
        }

        let _loading = LoadingGuard::new(&self.loading);
        let outcome = match timeout(self.timeout, self.parser.parse_query(text, &self.schema)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(SmartSearchError::Timeout(self.timeout)),
        };

        match outcome.and_then(|value| FilterPatch::from_json(value, &self.schema)) {
            Ok(patch) => {
                info!(
                    provider = self.parser.provider_name(),
                    fields = patch.updates().len(),
                    "Parsed search text"
                );
                Ok(patch)
            }
            Err(err) => {
                warn!(provider = self.parser.provider_name(), "Smart search failed: {err}");
                Err(err)
            }
        }
    }
}
