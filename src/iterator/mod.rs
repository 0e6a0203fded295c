//! Iteration over a collection view
//!
//! Walks the remote result set page by page while keeping one page of
//! lookahead buffered:
//!
//! ```text
//! CollectionView::iter()
//!     ↓
//! PageIterator
//!     ├─→ current_page   (being read)
//!     ├─→ next_page      (prefetched)
//!     └─→ LocalCache     (Persisted views: every yielded record)
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Lookahead**: the page after the current one is always fetched before
//!    it is needed, so `has_next()` is a pure check
//! 2. **Short page = end**: a page shorter than the page size ends the walk
//!    and fixes the view's size
//! 3. **Loud failures**: a failed fetch is reported, never turned into a
//!    clean end of data
//!
//! ## Usage
//!
//! ```ignore
//! let mut iter = view.iter()?;
//! while iter.has_next() {
//!     let record = iter.next_entity()?;
//!     println!("{:?}", record.object_id());
//! }
//!
//! // Or as a std iterator of `Result<E>`
//! let all: Vec<Record> = view.iter()?.collect::<Result<_>>()?;
//! ```

mod page_iterator;

pub use page_iterator::PageIterator;
