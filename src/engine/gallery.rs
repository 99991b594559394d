use super::{
    CatalogLoadError, Direction, DynCatalogLoader, FavoritesStore, GalleryAction, Selection,
    SelectionCursor, SortOrder, ViewMode, ViewModeController, pipeline,
};
use crate::{GallerySettings, catalog::ImageDescriptor};
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Everything a presentation layer needs to render the gallery in one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GallerySnapshot {
    pub images: Vec<ImageDescriptor>,
    pub categories: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub selection: Selection,
    pub show_info: bool,
    pub view_mode: ViewMode,
    pub category: Option<String>,
    pub sort: SortOrder,
    pub favorites: Vec<u32>,
}

struct GalleryState {
    catalog: Option<Vec<ImageDescriptor>>,
    category: Option<String>,
    sort: SortOrder,
    /// Filtered and sorted catalog, canonical order.
    view_list: Vec<ImageDescriptor>,
    /// What is on screen: the view list, possibly shuffled.
    presentation: Vec<ImageDescriptor>,
    cursor: SelectionCursor,
    view_mode: ViewModeController,
    favorites: FavoritesStore,
    loading: bool,
    last_error: Option<CatalogLoadError>,
}

impl GalleryState {
    fn recompute(&mut self) {
        self.view_list = match &self.catalog {
            Some(catalog) => pipeline::apply(catalog, self.category.as_deref(), self.sort),
            None => Vec::new(),
        };
        self.presentation = self.view_list.clone();
    }

    fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.presentation.shuffle(rng);
        self.cursor.close();
    }
}

/// Single owner of the gallery's catalog, filter, cursor, view mode and
/// favorites state.
///
/// All methods take `&self`, so one `Gallery` can be shared behind an `Arc`
/// by every surface that renders it. Only catalog loading is async; a fetch
/// started while another is in flight waits for that one instead of issuing
/// a second request.
pub struct Gallery {
    loader: DynCatalogLoader,
    settings: GallerySettings,
    fetch_lock: tokio::sync::Mutex<()>,
    state: RwLock<GalleryState>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Gallery {
    pub fn new(loader: DynCatalogLoader, favorites: FavoritesStore, settings: GallerySettings) -> Self {
        Self::with_rng(loader, favorites, settings, StdRng::from_os_rng())
    }

    /// Like [`Gallery::new`] but shuffles with `rng`, for reproducible orderings.
    pub fn with_rng(
        loader: DynCatalogLoader,
        favorites: FavoritesStore,
        settings: GallerySettings,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        let state = GalleryState {
            catalog: None,
            category: None,
            sort: settings.default_sort,
            view_list: Vec::new(),
            presentation: Vec::new(),
            cursor: SelectionCursor::new(),
            view_mode: ViewModeController::new(settings.default_view_mode),
            favorites,
            loading: false,
            last_error: None,
        };

        Self {
            loader,
            settings,
            fetch_lock: tokio::sync::Mutex::new(()),
            state: RwLock::new(state),
            rng: Mutex::new(Box::new(rng)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, GalleryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GalleryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the catalog on first use; later calls reuse the cached copy.
    /// Returns the catalog size.
    pub async fn activate(&self) -> Result<usize, CatalogLoadError> {
        self.fetch(false).await
    }

    /// Fetches the catalog again, ignoring the cache. The current catalog stays
    /// visible until the new one arrives.
    pub async fn refresh(&self) -> Result<usize, CatalogLoadError> {
        self.fetch(true).await
    }

    async fn fetch(&self, force: bool) -> Result<usize, CatalogLoadError> {
        let _in_flight = match self.fetch_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Catalog fetch already in flight, waiting for its result");
                // Hold the lock while reading so no newer fetch can reset the outcome
                let _finished = self.fetch_lock.lock().await;
                return self.last_outcome();
            }
        };

        {
            let mut state = self.write();
            if !force
                && self.settings.enable_cache
                && let Some(catalog) = &state.catalog
            {
                debug!("Reusing cached catalog of {} images", catalog.len());
                return Ok(catalog.len());
            }

            state.loading = true;
            state.last_error = None;
        }

        info!("Loading catalog via {}", self.loader.name());
        let result = self.loader.load().await;

        let mut state = self.write();
        state.loading = false;

        match result {
            Ok(images) => {
                let count = images.len();
                state.catalog = Some(images);
                state.recompute();
                if self.settings.shuffle_on_load {
                    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                    state.shuffle(&mut *rng);
                }
                info!("Catalog loaded with {} images", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load catalog via {}: {}", self.loader.name(), e);
                state.catalog = None;
                state.last_error = Some(e.clone());
                state.view_list.clear();
                state.presentation.clear();
                state.cursor.close();
                Err(e)
            }
        }
    }

    fn last_outcome(&self) -> Result<usize, CatalogLoadError> {
        let state = self.read();
        match &state.last_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.catalog.as_ref().map_or(0, Vec::len)),
        }
    }

    pub fn set_category(&self, category: Option<String>) {
        let mut state = self.write();
        state.category = category;
        state.recompute();
    }

    pub fn set_sort(&self, sort: SortOrder) {
        let mut state = self.write();
        state.sort = sort;
        state.recompute();
    }

    /// Opens `item` at `index` of the presentation list. Whichever layout
    /// triggered it, the same cursor is updated. Out-of-range indices are
    /// ignored and return false.
    pub fn select(&self, item: ImageDescriptor, index: usize) -> bool {
        let mut state = self.write();
        if index >= state.presentation.len() {
            debug!(
                "Ignoring selection of index {} over {} items",
                index,
                state.presentation.len()
            );
            return false;
        }
        state.cursor.select(item, index);
        true
    }

    pub fn select_index(&self, index: usize) -> bool {
        let Some(item) = self.read().presentation.get(index).cloned() else {
            debug!("Ignoring selection of missing index {}", index);
            return false;
        };
        self.select(item, index)
    }

    pub fn close(&self) {
        self.write().cursor.close();
    }

    pub fn navigate(&self, direction: Direction) -> bool {
        let mut state = self.write();
        let GalleryState {
            cursor,
            presentation,
            ..
        } = &mut *state;
        cursor.navigate(direction, presentation)
    }

    pub fn toggle_info(&self) -> bool {
        self.write().cursor.toggle_info()
    }

    /// Routes a lightbox action to the cursor. Actions only apply while the
    /// lightbox is open. Returns whether state changed.
    pub fn dispatch(&self, action: GalleryAction) -> bool {
        let mut state = self.write();
        let GalleryState {
            cursor,
            presentation,
            ..
        } = &mut *state;

        if !cursor.is_open() {
            debug!("Ignoring {:?} while the lightbox is closed", action);
            return false;
        }

        match action {
            GalleryAction::Navigate(direction) => cursor.navigate(direction, presentation),
            GalleryAction::Close => {
                cursor.close();
                true
            }
            GalleryAction::ToggleInfo => {
                cursor.toggle_info();
                true
            }
        }
    }

    /// Switches layout. A real change reshuffles when `shuffle_on_view_change`
    /// is set. Returns whether the mode changed.
    pub fn set_view_mode(&self, mode: ViewMode) -> bool {
        let changed = self.write().view_mode.set(mode);
        if changed && self.settings.shuffle_on_view_change {
            self.shuffle();
        }
        changed
    }

    /// New random presentation order of the current view list. The catalog,
    /// filter, sort and favorites are left alone; the cursor is closed.
    pub fn shuffle(&self) {
        let mut state = self.write();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        state.shuffle(&mut *rng);
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&self, rng: &mut R) {
        self.write().shuffle(rng);
    }

    pub fn toggle_favorite(&self, id: u32) -> bool {
        self.write().favorites.toggle(id)
    }

    pub fn add_favorite(&self, id: u32) {
        self.write().favorites.add(id);
    }

    pub fn remove_favorite(&self, id: u32) {
        self.write().favorites.remove(id);
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.read().favorites.is_favorite(id)
    }

    pub fn clear_favorites(&self) {
        self.write().favorites.clear();
    }

    /// Favorite ids, oldest first.
    pub fn favorites(&self) -> Vec<u32> {
        self.read().favorites.ids().to_vec()
    }

    /// Favorites resolved against the loaded catalog; unknown ids are skipped.
    pub fn favorite_images(&self) -> Vec<ImageDescriptor> {
        let state = self.read();
        let Some(catalog) = &state.catalog else {
            return Vec::new();
        };
        state
            .favorites
            .ids()
            .iter()
            .filter_map(|id| catalog.iter().find(|image| image.id == *id).cloned())
            .collect()
    }

    /// Presentation order: the view list, shuffled if a shuffle happened.
    pub fn images(&self) -> Vec<ImageDescriptor> {
        self.read().presentation.clone()
    }

    pub fn view_list(&self) -> Vec<ImageDescriptor> {
        self.read().view_list.clone()
    }

    pub fn catalog(&self) -> Vec<ImageDescriptor> {
        self.read().catalog.clone().unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<String> {
        self.read()
            .catalog
            .as_deref()
            .map(pipeline::categories)
            .unwrap_or_default()
    }

    pub fn category(&self) -> Option<String> {
        self.read().category.clone()
    }

    pub fn sort(&self) -> SortOrder {
        self.read().sort
    }

    pub fn view_mode(&self) -> ViewMode {
        self.read().view_mode.get()
    }

    pub fn selection(&self) -> Selection {
        self.read().cursor.selection().clone()
    }

    pub fn show_info(&self) -> bool {
        self.read().cursor.show_info()
    }

    pub fn error(&self) -> Option<String> {
        self.read().last_error.as_ref().map(ToString::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn favorites_persistent(&self) -> bool {
        self.read().favorites.is_persistent()
    }

    pub fn snapshot(&self) -> GallerySnapshot {
        let state = self.read();
        GallerySnapshot {
            images: state.presentation.clone(),
            categories: state
                .catalog
                .as_deref()
                .map(pipeline::categories)
                .unwrap_or_default(),
            loading: state.loading,
            error: state.last_error.as_ref().map(ToString::to_string),
            selection: state.cursor.selection().clone(),
            show_info: state.cursor.show_info(),
            view_mode: state.view_mode.get(),
            category: state.category.clone(),
            sort: state.sort,
            favorites: state.favorites.ids().to_vec(),
        }
    }
}
