use std::sync::atomic::{AtomicU64, Ordering};

/// Per-view statistics
///
/// Shared between a view and every iterator it spawns. Uses atomic counters
/// for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Remote calls
    pub page_fetches: AtomicU64,
    pub records_fetched: AtomicU64,
    pub count_queries: AtomicU64,
    pub delete_calls: AtomicU64,
    pub records_deleted: AtomicU64,
    pub remote_failures: AtomicU64,

    // Iteration
    pub iterators_created: AtomicU64,
    pub replay_iterators: AtomicU64,
    pub records_yielded: AtomicU64,
    pub size_corrections: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_page_fetch(&self, records: u64) {
        self.page_fetches.fetch_add(1, Ordering::Relaxed);
        self.records_fetched.fetch_add(records, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_count_query(&self) {
        self.count_queries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self, records: u64) {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        self.records_deleted.fetch_add(records, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_remote_failure(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_iterator(&self, replay: bool) {
        self.iterators_created.fetch_add(1, Ordering::Relaxed);
        if replay {
            self.replay_iterators.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_yield(&self) {
        self.records_yielded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_size_correction(&self) {
        self.size_corrections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_fetches(&self) -> u64 {
        self.page_fetches.load(Ordering::Relaxed)
    }

    pub fn count_queries(&self) -> u64 {
        self.count_queries.load(Ordering::Relaxed)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::Relaxed)
    }

    pub fn remote_failures(&self) -> u64 {
        self.remote_failures.load(Ordering::Relaxed)
    }

    pub fn iterators_created(&self) -> u64 {
        self.iterators_created.load(Ordering::Relaxed)
    }

    pub fn replay_iterators(&self) -> u64 {
        self.replay_iterators.load(Ordering::Relaxed)
    }

    pub fn records_yielded(&self) -> u64 {
        self.records_yielded.load(Ordering::Relaxed)
    }

    pub fn size_corrections(&self) -> u64 {
        self.size_corrections.load(Ordering::Relaxed)
    }

    /// Average number of records per fetched page
    pub fn avg_page_fill(&self) -> f64 {
        let pages = self.page_fetches() as f64;
        if pages > 0.0 {
            self.records_fetched.load(Ordering::Relaxed) as f64 / pages
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.page_fetches.store(0, Ordering::Relaxed);
        self.records_fetched.store(0, Ordering::Relaxed);
        self.count_queries.store(0, Ordering::Relaxed);
        self.delete_calls.store(0, Ordering::Relaxed);
        self.records_deleted.store(0, Ordering::Relaxed);
        self.remote_failures.store(0, Ordering::Relaxed);
        self.iterators_created.store(0, Ordering::Relaxed);
        self.replay_iterators.store(0, Ordering::Relaxed);
        self.records_yielded.store(0, Ordering::Relaxed);
        self.size_corrections.store(0, Ordering::Relaxed);
    }

    /// Get a formatted statistics report
    pub fn report(&self) -> String {
        format!(
            "View Statistics:\n\
            \n\
            Remote:\n\
            - Page fetches:    {}\n\
            - Records fetched: {} ({:.2} per page)\n\
            - Count queries:   {}\n\
            - Delete calls:    {}\n\
            - Records deleted: {}\n\
            - Failures:        {}\n\
            \n\
            Iteration:\n\
            - Iterators:       {} ({} replayed)\n\
            - Records yielded: {}\n\
            - Size corrections: {}",
            self.page_fetches(),
            self.records_fetched.load(Ordering::Relaxed),
            self.avg_page_fill(),
            self.count_queries(),
            self.delete_calls(),
            self.records_deleted.load(Ordering::Relaxed),
            self.remote_failures(),
            self.iterators_created(),
            self.replay_iterators(),
            self.records_yielded(),
            self.size_corrections(),
        )
    }
}
