use std::{fmt, iter::FusedIterator, sync::Arc};

use tracing::{debug, warn};

use crate::{
    cache::LocalCache,
    entity::Identifiable,
    query::Filter,
    remote::{PageRequest, RemoteStore},
    statistics::Statistics,
    util::{Result, Status},
    view::{CollectionView, ViewState},
};

/// Forward cursor over a view's records with one page of lookahead
///
/// The iterator keeps the page it is reading (`current_page`) and the
/// following page (`next_page`) buffered. Taking the last record of the
/// current page promotes the lookahead page and fetches the one after it, so
/// [`has_next`](PageIterator::has_next) never needs the network.
///
/// # State
///
/// ```text
/// Priming    inside the constructor: page 0 and (if page 0 is full) page 1
/// Active     current page has records left, or next page is non-empty
/// Exhausted  both pages gone; next_entity() reports IterationExhausted
/// ```
///
/// A page shorter than the page size proves the end of the result set; it
/// also pins down the exact total, which is written back to the view's
/// approximate size the first time it is seen. When the total is an exact
/// multiple of the page size, exhaustion is only declared after one more
/// fetch comes back empty.
///
/// # Failures
///
/// A failed fetch while priming fails construction. A failed fetch while
/// advancing is held back: records already buffered are still yielded, then
/// `next_entity()` returns the `RemoteFailure` once and the iterator is
/// exhausted. Nothing from a failed fetch reaches the cache.
///
/// # Replay
///
/// Iterators created after [`CollectionView::populate`] read a snapshot of the
/// view's cache as a single page and never touch the network.
pub struct PageIterator<E, S> {
    store: Arc<S>,
    filter: Filter,
    page_size: usize,
    /// Last page requested from the store
    page: PageRequest,
    /// Records yielded so far
    position: usize,
    current_page: Option<Vec<E>>,
    next_page: Option<Vec<E>>,
    /// Records received from the store so far
    fetched: usize,
    end_located: bool,
    failure: Option<Status>,
    replay: bool,
    cache: Option<LocalCache<E>>,
    cache_generation: u64,
    state: Arc<ViewState>,
    epoch: u64,
    stats: Arc<Statistics>,
}

impl<E, S> PageIterator<E, S>
where
    E: Identifiable,
    S: RemoteStore<E>,
{
    /// Prime a cursor against the remote store
    pub(crate) fn remote(view: &CollectionView<E, S>) -> Result<Self> {
        let page_size = view.options.page_size;
        let first = PageRequest::first(page_size);

        let mut iter = Self::unprimed(view, page_size, false);
        view.stats.record_iterator(false);

        let current = iter.fetch(first)?;
        let next = if current.len() < page_size {
            None
        } else {
            Some(iter.fetch(first.next_page())?)
        };

        iter.current_page = Some(current);
        iter.next_page = next;
        Ok(iter)
    }

    /// Cursor over records already materialized in the view's cache
    pub(crate) fn replay(view: &CollectionView<E, S>, records: Vec<E>) -> Self {
        let mut iter = Self::unprimed(view, records.len().max(1), true);
        view.stats.record_iterator(true);
        debug!(target: "pagedview::iter", records = records.len(), "Replaying cached records");

        iter.fetched = records.len();
        iter.end_located = true;
        iter.current_page = Some(records);
        iter
    }

    fn unprimed(view: &CollectionView<E, S>, page_size: usize, replay: bool) -> Self {
        let cache = view.cache.clone();
        let cache_generation = cache.as_ref().map_or(0, |c| c.generation());
        PageIterator {
            store: Arc::clone(&view.store),
            filter: Filter::slice(&view.slice),
            page_size,
            page: PageRequest::first(page_size),
            position: 0,
            current_page: None,
            next_page: None,
            fetched: 0,
            end_located: false,
            failure: None,
            replay,
            cache,
            cache_generation,
            state: Arc::clone(&view.state),
            epoch: view.state.epoch(),
            stats: Arc::clone(&view.stats),
        }
    }

    /// Whether another call to `next_entity` will produce a record or a
    /// pending failure
    ///
    /// Pure: never fetches and never changes the cursor.
    pub fn has_next(&self) -> bool {
        let current_has_more = self
            .current_page
            .as_ref()
            .is_some_and(|page| self.position % self.page_size < page.len());
        let next_has_more = self.next_page.as_ref().is_some_and(|page| !page.is_empty());

        current_has_more || next_has_more || self.failure.is_some()
    }

    /// Take the next record
    ///
    /// Returns `Code::IterationExhausted` at the end of the result set and
    /// `Code::RemoteFailure` (once) if a page fetch failed.
    pub fn next_entity(&mut self) -> Result<E> {
        let index = self.position % self.page_size;
        let (entity, last_on_page) = match &self.current_page {
            Some(page) if index < page.len() => (page[index].clone(), index + 1 == page.len()),
            _ => return Err(self.failure.take().unwrap_or_else(Status::exhausted)),
        };

        self.position += 1;
        self.stats.record_yield();
        self.remember(&entity);

        // Cross the page boundary now so the following call never waits on a
        // fetch that could have happened ahead of time.
        if last_on_page {
            self.advance();
        }

        Ok(entity)
    }

    /// Records yielded so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_replay(&self) -> bool {
        self.replay
    }

    fn remember(&self, entity: &E) {
        if self.replay {
            return;
        }
        if let (Some(cache), Some(id)) = (&self.cache, entity.object_id()) {
            cache.upsert_if_current(self.cache_generation, id, entity.clone());
        }
    }

    fn advance(&mut self) {
        let promoted = match self.next_page.take() {
            Some(page) if !page.is_empty() => page,
            _ => {
                self.current_page = None;
                debug!(target: "pagedview::iter", position = self.position, "Iteration exhausted");
                return;
            }
        };

        let is_last = promoted.len() < self.page_size;
        self.current_page = Some(promoted);
        if is_last {
            return;
        }

        match self.fetch(self.page.next_page()) {
            Ok(page) => self.next_page = Some(page),
            Err(err) => {
                warn!(
                    target: "pagedview::iter",
                    filter = %self.filter,
                    position = self.position,
                    error = %err,
                    "Page fetch failed, iteration will stop"
                );
                self.failure = Some(err);
            }
        }
    }

    fn fetch(&mut self, page: PageRequest) -> Result<Vec<E>> {
        debug!(
            target: "pagedview::iter",
            filter = %self.filter,
            offset = page.offset,
            page_size = page.page_size,
            "Fetching page"
        );

        let mut records = self.store.fetch_page(&self.filter, page).inspect_err(|_| {
            self.stats.record_remote_failure();
        })?;
        if records.len() > page.page_size {
            warn!(
                target: "pagedview::iter",
                requested = page.page_size,
                received = records.len(),
                "Store returned an oversized page, truncating"
            );
            records.truncate(page.page_size);
        }

        self.stats.record_page_fetch(records.len() as u64);
        self.page = page;
        self.fetched += records.len();

        if records.len() < page.page_size {
            self.locate_end();
        }
        Ok(records)
    }

    /// A short page was received: `fetched` is now the exact total
    fn locate_end(&mut self) {
        if self.end_located {
            return;
        }
        self.end_located = true;

        if let Some(previous) = self.state.correct_size(self.epoch, self.fetched) {
            if previous != self.fetched {
                self.stats.record_size_correction();
            }
            debug!(
                target: "pagedview::iter",
                previous,
                size = self.fetched,
                "Located end of result set"
            );
        }
    }
}

impl<E, S> Iterator for PageIterator<E, S>
where
    E: Identifiable,
    S: RemoteStore<E>,
{
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_entity() {
            Ok(entity) => Some(Ok(entity)),
            Err(status) if status.is_exhausted() => None,
            Err(status) => Some(Err(status)),
        }
    }
}

impl<E, S> FusedIterator for PageIterator<E, S>
where
    E: Identifiable,
    S: RemoteStore<E>,
{
}

impl<E, S> fmt::Debug for PageIterator<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageIterator")
            .field("filter", &self.filter)
            .field("page_size", &self.page_size)
            .field("page", &self.page)
            .field("position", &self.position)
            .field("fetched", &self.fetched)
            .field("end_located", &self.end_located)
            .field("failure", &self.failure)
            .field("replay", &self.replay)
            .finish()
    }
}
