pub mod collection_view;
mod state;
pub mod view_options;

pub use collection_view::CollectionView;
pub(crate) use state::ViewState;
pub use view_options::{CacheMode, DEFAULT_PAGE_SIZE, ViewOptions};
