use parking_lot::Mutex;

/// Bookkeeping shared by a view and its iterators
///
/// Every invalidation starts a new epoch. Size corrections and the loaded
/// flag are only accepted from holders of the current epoch, so an iterator
/// that started before an invalidation cannot overwrite the freshly counted
/// size.
pub(crate) struct ViewState {
    inner: Mutex<ViewStateInner>,
}

struct ViewStateInner {
    approximate_size: usize,
    loaded: bool,
    epoch: u64,
}

impl ViewState {
    pub(crate) fn new(approximate_size: usize) -> Self {
        ViewState {
            inner: Mutex::new(ViewStateInner {
                approximate_size,
                loaded: false,
                epoch: 0,
            }),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.inner.lock().approximate_size
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.inner.lock().loaded
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// The current epoch if the view is loaded
    pub(crate) fn loaded_epoch(&self) -> Option<u64> {
        let inner = self.inner.lock();
        inner.loaded.then_some(inner.epoch)
    }

    /// Start a new epoch and forget that the cache was fully loaded
    pub(crate) fn begin_invalidation(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.loaded = false;
        inner.epoch
    }

    /// Replace the size if `epoch` is still current, returning the old size
    pub(crate) fn correct_size(&self, epoch: u64, size: usize) -> Option<usize> {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return None;
        }
        Some(std::mem::replace(&mut inner.approximate_size, size))
    }

    pub(crate) fn mark_loaded(&self, epoch: u64, size: usize) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.approximate_size = size;
        inner.loaded = true;
        true
    }
}
