pub mod memory;

pub use memory::MemoryStore;

use crate::{query::Filter, util::Result};

/// Position and size of one page of a query's result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        PageRequest {
            page_size,
            offset: 0,
        }
    }

    /// The request for the page following this one
    pub fn next_page(&self) -> Self {
        PageRequest {
            page_size: self.page_size,
            offset: self.offset + self.page_size,
        }
    }
}

/// Remote record store a view reads from and deletes through
///
/// Every call is a blocking network round trip from the caller's point of
/// view. Implementations report transport and server errors as
/// `Status::remote_failure`; the view propagates them unchanged and never
/// retries.
///
/// Page order must be stable across calls for the same filter: the page at
/// `offset` is always the records following those returned for smaller
/// offsets.
pub trait RemoteStore<E>: Send + Sync {
    /// Number of records matching `filter`
    fn count(&self, filter: &Filter) -> Result<usize>;

    /// At most `page.page_size` records matching `filter`, starting at
    /// `page.offset`
    ///
    /// A page shorter than requested means there are no further records.
    fn fetch_page(&self, filter: &Filter, page: PageRequest) -> Result<Vec<E>>;

    /// Delete every record matching `filter`, returning how many were removed
    fn delete(&self, filter: &Filter) -> Result<usize>;
}
