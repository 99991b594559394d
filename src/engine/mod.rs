//! Gallery state engine: catalog loading, filter and sort, lightbox cursor,
//! view mode and persisted favorites, composed behind [`Gallery`].

mod cursor;
mod error;
mod favorites;
mod gallery;
mod keys;
mod loader;
mod pipeline;
mod view_mode;


pub use cursor::{Direction, Selection, SelectionCursor};
pub use error::{CatalogLoadError, PersistenceError};
pub use favorites::{DynKeyValueStore, FavoritesStore, FileStore, KeyValueStore, MemoryStore};
pub use gallery::{Gallery, GallerySnapshot};
pub use keys::{GalleryAction, action_for_key};
pub use loader::{
    CatalogLoader, DirectoryCatalogLoader, DynCatalogLoader, HttpCatalogLoader, parse_catalog,
};
pub use pipeline::{SortOrder, apply, categories};
pub use view_mode::{ViewMode, ViewModeController};
