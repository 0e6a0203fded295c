//! A client-side collection view over a remote, paginated record store
//!
//! A [`CollectionView`] selects the records of one entity type that match a
//! filter ([`Slice`]) and presents them as a single collection. Iteration
//! walks the remote result set page by page with one page of lookahead
//! ([`PageIterator`]); persisted views keep every iterated record in a
//! [`LocalCache`] shared by all of their iterators.
//!
//! The network store is reached through the [`RemoteStore`] trait;
//! [`MemoryStore`] is an in-process implementation.

pub mod cache;
pub mod entity;
pub mod iterator;
pub mod query;
pub mod remote;
pub mod statistics;
pub mod util;
pub mod view;

pub use cache::{CacheStats, LocalCache};
pub use entity::{Identifiable, Record};
pub use iterator::PageIterator;
pub use query::{Filter, IdentityPredicate, Slice};
pub use remote::{MemoryStore, PageRequest, RemoteStore};
pub use statistics::Statistics;
pub use util::{Code, Result, Status};
pub use view::{CacheMode, CollectionView, DEFAULT_PAGE_SIZE, ViewOptions};
