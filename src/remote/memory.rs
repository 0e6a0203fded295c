use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::{
    entity::Identifiable,
    query::{Filter, Slice},
    remote::{PageRequest, RemoteStore},
    util::{Result, Status},
};

type SliceMatcher<E> = Box<dyn Fn(&Slice, &E) -> bool + Send + Sync>;

/// In-process `RemoteStore` backed by an insertion-ordered `Vec`
///
/// Identity predicates are evaluated structurally. Base slices are opaque to
/// the store: the empty slice selects everything, anything else is handed to
/// the matcher given to [`MemoryStore::with_slice_matcher`] (without one, a
/// non-empty slice selects nothing).
///
/// Counts every call and can be told to fail the next N calls, which makes it
/// the test double for the network store.
///
/// # Example
///
/// ```ignore
/// use pagedview::{MemoryStore, Record, Slice};
///
/// let store = MemoryStore::with_slice_matcher(|slice: &Slice, record: &Record| {
///     record.get("team").and_then(|v| v.as_str()) == Some(slice.as_str())
/// });
/// store.insert(Record::new("Player", "p1").with_field("team", "red"));
/// ```
pub struct MemoryStore<E> {
    records: RwLock<Vec<E>>,
    matcher: SliceMatcher<E>,
    pending_failures: AtomicUsize,
    count_calls: AtomicU64,
    fetch_calls: AtomicU64,
    delete_calls: AtomicU64,
    fetch_log: Mutex<Vec<PageRequest>>,
}

impl<E: Identifiable> MemoryStore<E> {
    pub fn new() -> Self {
        MemoryStore::with_slice_matcher(|_, _| false)
    }

    pub fn with_slice_matcher<F>(matcher: F) -> Self
    where
        F: Fn(&Slice, &E) -> bool + Send + Sync + 'static,
    {
        MemoryStore {
            records: RwLock::new(Vec::new()),
            matcher: Box::new(matcher),
            pending_failures: AtomicUsize::new(0),
            count_calls: AtomicU64::new(0),
            fetch_calls: AtomicU64::new(0),
            delete_calls: AtomicU64::new(0),
            fetch_log: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, record: E) {
        self.records.write().push(record);
    }

    pub fn insert_all(&self, records: impl IntoIterator<Item = E>) {
        self.records.write().extend(records);
    }

    /// Every stored record, in insertion order
    pub fn records(&self) -> Vec<E> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Make the next `n` remote calls fail with `Code::RemoteFailure`
    pub fn fail_next(&self, n: usize) {
        self.pending_failures.store(n, Ordering::SeqCst);
    }

    pub fn count_calls(&self) -> u64 {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Page requests received so far, in arrival order
    pub fn fetch_log(&self) -> Vec<PageRequest> {
        self.fetch_log.lock().clone()
    }

    fn matches(&self, filter: &Filter, record: &E) -> bool {
        let base = filter.base();
        (base.is_empty() || (self.matcher)(base, record))
            && filter.identity_predicate().matches(record.object_id())
    }

    fn check_failure(&self, op: &str) -> Result<()> {
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(Status::remote_failure(format!("injected failure in {op}")));
        }
        Ok(())
    }
}

impl<E: Identifiable> Default for MemoryStore<E> {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl<E: Identifiable> RemoteStore<E> for MemoryStore<E> {
    fn count(&self, filter: &Filter) -> Result<usize> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("count")?;

        let records = self.records.read();
        Ok(records.iter().filter(|r| self.matches(filter, r)).count())
    }

    fn fetch_page(&self, filter: &Filter, page: PageRequest) -> Result<Vec<E>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_log.lock().push(page);
        self.check_failure("fetch_page")?;

        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| self.matches(filter, r))
            .skip(page.offset)
            .take(page.page_size)
            .cloned()
            .collect())
    }

    fn delete(&self, filter: &Filter) -> Result<usize> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("delete")?;

        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| !self.matches(filter, r));
        Ok(before - records.len())
    }
}
