//! Debounced, paginated search over a listing endpoint.
//!
//! Typed input is kept apart from the committed term. Each keystroke
//! cancels the pending timer and starts a new one; only when the input has
//! been stable for the quiet period does it become the term, which resets
//! the page to zero and fetches. Page, size and sort changes fetch right
//! away.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use storefront_core::{Product, SearchQuery, SortDirection, User};

use crate::api::SearchSource;
use crate::config::SearchConfig;
use crate::error::Result;

/// What a listing view renders
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot<T> {
    /// Raw input as typed
    pub input: String,
    /// The requested query. After a failed fetch it can be ahead of
    /// `content`, which keeps the last successful results.
    pub query: SearchQuery,
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl<T> SearchSnapshot<T> {
    fn new(query: SearchQuery) -> Self {
        Self {
            input: query.term.clone(),
            query,
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            loading: false,
            last_error: None,
        }
    }

    /// A debounce is pending: the input has not become the term yet.
    pub fn searching(&self) -> bool {
        self.input != self.query.term
    }
}

struct Inner<T> {
    source: Arc<dyn SearchSource<T>>,
    quiet_period: Duration,
    state: watch::Sender<SearchSnapshot<T>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    generation: AtomicU64,
}

/// Search controller for one listing
pub struct SearchController<T> {
    inner: Arc<Inner<T>>,
}

impl SearchController<Product> {
    /// Product catalog listing, sorted by name.
    pub fn products(source: Arc<dyn SearchSource<Product>>, config: &SearchConfig) -> Self {
        Self::new(
            source,
            SearchQuery::new(config.product_page_size, "name"),
            config.debounce(),
        )
    }
}

impl SearchController<User> {
    /// User administration listing, sorted by full name ascending.
    pub fn users(source: Arc<dyn SearchSource<User>>, config: &SearchConfig) -> Self {
        Self::new(
            source,
            SearchQuery::new(config.user_page_size, "fullName").with_direction(SortDirection::Asc),
            config.debounce(),
        )
    }
}

impl<T> SearchController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn SearchSource<T>>, query: SearchQuery, quiet_period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                quiet_period,
                state: watch::Sender::new(SearchSnapshot::new(query)),
                pending: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot<T> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot<T>> {
        self.inner.state.subscribe()
    }

    pub fn searching(&self) -> bool {
        self.inner.state.borrow().searching()
    }

    /// Record a keystroke and restart the quiet period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        let changed = self.inner.state.send_if_modified(|s| {
            if s.input == input {
                return false;
            }
            s.input = input;
            true
        });
        if !changed {
            return;
        }

        self.cancel_pending();
        if !self.searching() {
            return;
        }

        // Only the quiet period is cancellable; the fetch runs on its own.
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.quiet_period).await;
            if inner.commit_term() {
                tokio::spawn(async move {
                    if let Err(e) = inner.fetch().await {
                        debug!("Debounced search failed: {}", e);
                    }
                });
            }
        });
        *self.lock_pending() = Some(handle);
    }

    /// Skip the rest of the quiet period and commit the input now.
    ///
    /// Returns without fetching when the input is already the term.
    pub async fn commit_now(&self) -> Result<()> {
        self.cancel_pending();
        if !self.inner.commit_term() {
            return Ok(());
        }
        self.inner.fetch().await
    }

    /// Fetch the current query again.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.fetch().await
    }

    pub async fn set_page(&self, page: u32) -> Result<()> {
        if !self.inner.modify_query(|q| q.page = page) {
            return Ok(());
        }
        self.inner.fetch().await
    }

    /// Change the page size, going back to the first page.
    pub async fn set_page_size(&self, size: u32) -> Result<()> {
        if !self.inner.modify_query(|q| {
            q.size = size;
            q.page = 0;
        }) {
            return Ok(());
        }
        self.inner.fetch().await
    }

    pub async fn set_sort(&self, sort: impl Into<String>) -> Result<()> {
        let sort = sort.into();
        if !self.inner.modify_query(|q| q.sort = sort) {
            return Ok(());
        }
        self.inner.fetch().await
    }

    pub async fn set_direction(&self, direction: SortDirection) -> Result<()> {
        if !self.inner.modify_query(|q| q.direction = Some(direction)) {
            return Ok(());
        }
        self.inner.fetch().await
    }

    /// Column-header behaviour: the same key flips the direction, a new key
    /// sorts ascending.
    pub async fn sort_by(&self, sort: impl Into<String>) -> Result<()> {
        let sort = sort.into();
        self.inner.modify_query(|q| {
            if q.sort == sort {
                q.direction = Some(q.direction.unwrap_or_default().toggled());
            } else {
                q.sort = sort;
                q.direction = Some(SortDirection::Asc);
            }
        });
        self.inner.fetch().await
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }
}

impl<T> Drop for SearchController<T> {
    fn drop(&mut self) {
        let pending = match self.inner.pending.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = pending {
            handle.abort();
        }
    }
}

/// Clears `loading` if the newest fetch is dropped before it answers.
struct LoadingGuard<'a, T> {
    inner: &'a Inner<T>,
    generation: u64,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.inner.generation.load(Ordering::SeqCst) != self.generation {
            return;
        }
        self.inner.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Apply `change` to the query; returns whether anything changed.
    fn modify_query(&self, change: impl FnOnce(&mut SearchQuery)) -> bool {
        self.state.send_if_modified(|s| {
            let before = s.query.clone();
            change(&mut s.query);
            s.query != before
        })
    }

    /// Promote the input to the term. A new term starts at page zero.
    /// Returns whether the term changed.
    fn commit_term(&self) -> bool {
        self.state.send_if_modified(|s| {
            if !s.searching() {
                return false;
            }
            s.query.term = s.input.clone();
            s.query.page = 0;
            true
        })
    }

    /// Run the current query. Responses to superseded requests are dropped.
    async fn fetch(&self) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut query = None;
        self.state.send_modify(|s| {
            s.loading = true;
            query = Some(s.query.clone());
        });
        let Some(query) = query else {
            return Ok(());
        };
        let _loading = LoadingGuard {
            inner: self,
            generation,
        };

        debug!("Searching {:?} page {} (request {})", query.term, query.page, generation);
        let result = self.source.search(&query).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale search response {}", generation);
            return result.map(|_| ());
        }

        match result {
            Ok(page) => {
                self.state.send_modify(|s| {
                    s.content = page.content;
                    s.total_elements = page.total_elements;
                    s.total_pages = page.total_pages;
                    s.loading = false;
                    s.last_error = None;
                });
                Ok(())
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                let message = e.user_message();
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(message);
                });
                Err(e)
            }
        }
    }
}
