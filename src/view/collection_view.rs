use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tracing::{debug, info};

use crate::{
    cache::{CacheStats, LocalCache},
    entity::Identifiable,
    iterator::PageIterator,
    query::{Filter, Slice},
    remote::RemoteStore,
    statistics::Statistics,
    util::{Result, Status},
    view::{CacheMode, ViewOptions, ViewState},
};

/// A remote record set presented as one logical collection
///
/// The view selects the records of one entity type that match its slice.
/// Reads go to the remote store page by page; in `Persisted` mode every
/// iterated record is also kept in a cache shared by all iterators of the
/// view.
///
/// `size()` is a hint: it is counted when the view opens, refreshed by
/// `invalidate_state`, and corrected by iterators that reach the end of the
/// result set. Mutations do not refresh it.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use pagedview::{CollectionView, MemoryStore, Record, ViewOptions};
///
/// let store = Arc::new(MemoryStore::new());
/// store.insert(Record::new("Person", "p1"));
///
/// let view = CollectionView::all(store, "Person", ViewOptions::persisted())?;
/// for record in view.iter()? {
///     println!("{:?}", record?);
/// }
/// ```
pub struct CollectionView<E, S> {
    pub(crate) entity_type: String,
    pub(crate) slice: Slice,
    pub(crate) store: Arc<S>,
    pub(crate) options: ViewOptions,
    /// Present iff the view is persisted
    pub(crate) cache: Option<LocalCache<E>>,
    pub(crate) state: Arc<ViewState>,
    pub(crate) stats: Arc<Statistics>,
}

impl<E, S> CollectionView<E, S>
where
    E: Identifiable,
    S: RemoteStore<E>,
{
    /// Open a view over the records of `entity_type` matching `slice`
    ///
    /// Counts the matching records to initialise `size()`.
    pub fn open(
        store: Arc<S>,
        entity_type: impl Into<String>,
        slice: impl Into<Slice>,
        options: ViewOptions,
    ) -> Result<Self> {
        options.validate()?;

        let cache = match options.cache_mode {
            CacheMode::Persisted => Some(LocalCache::new()),
            CacheMode::Transient => None,
        };

        let mut view = CollectionView {
            entity_type: entity_type.into(),
            slice: slice.into(),
            store,
            options,
            cache,
            state: Arc::new(ViewState::new(0)),
            stats: Arc::new(Statistics::new()),
        };

        let size = view.remote_count(&Filter::slice(&view.slice))?;
        view.state = Arc::new(ViewState::new(size));

        debug!(
            target: "pagedview::view",
            entity_type = %view.entity_type,
            slice = %view.slice,
            size,
            persisted = view.is_persisted(),
            "Opened collection view"
        );
        Ok(view)
    }

    /// Open a view over every record of `entity_type`
    pub fn all(store: Arc<S>, entity_type: impl Into<String>, options: ViewOptions) -> Result<Self> {
        Self::open(store, entity_type, Slice::all(), options)
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Approximate number of records; never touches the network
    pub fn size(&self) -> usize {
        self.state.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_persisted(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of cached records, `None` for transient views
    pub fn persisted_size(&self) -> Option<usize> {
        self.cache.as_ref().map(LocalCache::len)
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(LocalCache::stats)
    }

    /// Whether the whole result set has been materialized by `populate`
    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    /// Start a new cursor over the view
    ///
    /// Once the view is loaded, iterators replay the cache without any
    /// network access. Otherwise the first two pages are fetched here.
    pub fn iter(&self) -> Result<PageIterator<E, S>> {
        if let (Some(cache), Some(epoch)) = (&self.cache, self.state.loaded_epoch()) {
            let records = cache.snapshot();
            // Epochs are bumped before the cache is cleared, so an unchanged
            // epoch means the snapshot is the complete loaded set.
            if self.state.loaded_epoch() == Some(epoch) {
                return Ok(PageIterator::replay(self, records));
            }
        }
        PageIterator::remote(self)
    }

    /// Collect every record of the view
    pub fn to_vec(&self) -> Result<Vec<E>> {
        self.iter()?.collect()
    }

    /// Whether `entity` is one of the view's records
    ///
    /// The cache can only confirm membership; the remote count is always
    /// consulted.
    pub fn contains(&self, entity: &E) -> Result<bool> {
        let id = self.check_entity(entity)?;

        let cached = self.cache.as_ref().is_some_and(|cache| cache.contains_key(id));
        let remote = self.remote_count(&Filter::identity(&self.slice, id))? > 0;

        Ok(cached || remote)
    }

    /// Delete `entity` remotely and drop it from the cache
    ///
    /// Returns whether anything was removed locally or remotely. Does not
    /// refresh `size()`.
    pub fn remove(&self, entity: &E) -> Result<bool> {
        let id = self.check_entity(entity)?;

        let removed = self.remote_delete(&Filter::identity(&self.slice, id))?;
        let evicted = self
            .cache
            .as_ref()
            .is_some_and(|cache| cache.remove(id).is_some());

        Ok(evicted || removed > 0)
    }

    /// Delete every entity of the batch in a single remote call
    ///
    /// Every entity is validated before anything is sent. Returns whether at
    /// least one record was removed locally or remotely.
    pub fn remove_all(&self, entities: &[E]) -> Result<bool> {
        let ids = entities
            .iter()
            .map(|entity| self.check_entity(entity))
            .collect::<Result<Vec<&str>>>()?;
        if ids.is_empty() {
            return Ok(false);
        }

        let removed = self.remote_delete(&Filter::identities(&self.slice, ids.iter().copied()))?;

        let mut evicted = false;
        if let Some(cache) = &self.cache {
            for id in &ids {
                evicted |= cache.remove(id).is_some();
            }
        }

        Ok(evicted || removed > 0)
    }

    /// Delete every record of the view, then resynchronise
    pub fn clear(&self) -> Result<()> {
        let removed = self.remote_delete(&Filter::slice(&self.slice))?;
        info!(
            target: "pagedview::view",
            entity_type = %self.entity_type,
            slice = %self.slice,
            removed,
            "Cleared collection view"
        );
        self.invalidate_state()
    }

    /// Drop cached records and recount the view
    ///
    /// Iterators created before this call keep their buffered pages but can
    /// no longer write to the cache or adjust the size.
    pub fn invalidate_state(&self) -> Result<()> {
        let epoch = self.state.begin_invalidation();
        if let Some(cache) = &self.cache {
            cache.clear();
        }

        let size = self.remote_count(&Filter::slice(&self.slice))?;
        self.state.correct_size(epoch, size);

        info!(
            target: "pagedview::view",
            entity_type = %self.entity_type,
            slice = %self.slice,
            size,
            "Invalidated collection view"
        );
        Ok(())
    }

    /// Walk the whole remote result set into the cache
    ///
    /// Afterwards the view is loaded: `size()` is exact and new iterators
    /// replay the cache. Only available on persisted views. Returns the
    /// number of records loaded.
    ///
    /// The view is unloaded for the duration of the walk and stays unloaded
    /// if it fails. Iterators started before the call are fenced off as by
    /// `invalidate_state`.
    pub fn populate(&self) -> Result<usize> {
        let Some(cache) = &self.cache else {
            return Err(Status::not_supported("populate requires a persisted view"));
        };

        // Unload first: replays must never see the cache while it refills
        let epoch = self.state.begin_invalidation();
        cache.clear();

        let mut loaded = 0;
        for record in PageIterator::remote(self)? {
            record?;
            loaded += 1;
        }

        if self.state.mark_loaded(epoch, loaded) {
            info!(
                target: "pagedview::view",
                entity_type = %self.entity_type,
                slice = %self.slice,
                loaded,
                "Populated collection view"
            );
        }
        Ok(loaded)
    }

    pub fn add(&self, _entity: E) -> Result<bool> {
        Err(Status::not_supported("add"))
    }

    pub fn add_all(&self, _entities: &[E]) -> Result<bool> {
        Err(Status::not_supported("add_all"))
    }

    pub fn contains_all(&self, _entities: &[E]) -> Result<bool> {
        Err(Status::not_supported("contains_all"))
    }

    pub fn retain_all(&self, _entities: &[E]) -> Result<bool> {
        Err(Status::not_supported("retain_all"))
    }

    /// Validate that `entity` can belong to this view, returning its identity
    fn check_entity<'a>(&self, entity: &'a E) -> Result<&'a str> {
        if entity.entity_type() != self.entity_type {
            return Err(Status::invalid_argument(format!(
                "{} is not a type objects of which are contained in this collection ({})",
                entity.entity_type(),
                self.entity_type
            )));
        }
        match entity.object_id() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(Status::invalid_argument("'objectId' is null")),
        }
    }

    fn remote_count(&self, filter: &Filter) -> Result<usize> {
        self.stats.record_count_query();
        self.store.count(filter).inspect_err(|_| {
            self.stats.record_remote_failure();
        })
    }

    fn remote_delete(&self, filter: &Filter) -> Result<usize> {
        let removed = self.store.delete(filter).inspect_err(|_| {
            self.stats.record_remote_failure();
        })?;
        self.stats.record_delete(removed as u64);
        debug!(target: "pagedview::view", filter = %filter, removed, "Deleted records");
        Ok(removed)
    }
}

impl<E, S> PartialEq for CollectionView<E, S> {
    fn eq(&self, other: &Self) -> bool {
        self.entity_type == other.entity_type && self.slice == other.slice
    }
}

impl<E, S> Eq for CollectionView<E, S> {}

impl<E, S> Hash for CollectionView<E, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_type.hash(state);
        self.slice.hash(state);
    }
}

impl<E, S> fmt::Debug for CollectionView<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionView")
            .field("entity_type", &self.entity_type)
            .field("slice", &self.slice)
            .field("cache_mode", &self.options.cache_mode)
            .field("size", &self.state.size())
            .field("loaded", &self.state.is_loaded())
            .finish()
    }
}
