//! Favorited image ids, persisted as a JSON array under one fixed key.
//!
//! Persistence failures never leave this module: a store whose backend stops
//! working keeps going in memory for the rest of the session.

use super::PersistenceError;
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{debug, info, warn};

/// Minimal string key-value persistence, in the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

pub type DynKeyValueStore = Arc<dyn KeyValueStore>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, PersistenceError> {
        self.entries
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside `directory`.
///
/// Writes go to a temporary file that is renamed over the old one, so a reader
/// sees either the previous value or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(PersistenceError::Unavailable(format!(
                "invalid storage key '{}'",
                key
            )));
        }
        Ok(self.directory.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.directory)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct FavoritesStore {
    backend: DynKeyValueStore,
    key: String,
    max_entries: usize,
    /// Insertion order, oldest first.
    ids: Vec<u32>,
    persistent: bool,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("key", &self.key)
            .field("max_entries", &self.max_entries)
            .field("ids", &self.ids)
            .field("persistent", &self.persistent)
            .finish()
    }
}

impl FavoritesStore {
    /// Opens the store and loads whatever is persisted under `key`.
    /// A `max_entries` of zero disables the cap.
    pub fn open(backend: DynKeyValueStore, key: impl Into<String>, max_entries: usize) -> Self {
        let mut store = Self {
            backend,
            key: key.into(),
            max_entries,
            ids: Vec::new(),
            persistent: true,
        };
        store.load();
        store
    }

    pub fn in_memory(max_entries: usize) -> Self {
        Self::open(Arc::new(MemoryStore::new()), "favorites", max_entries)
    }

    pub fn from_config(config: &crate::FavoritesConfig) -> Self {
        Self::open(
            Arc::new(FileStore::new(&config.directory)),
            config.key.clone(),
            config.max_entries,
        )
    }

    /// Re-reads the persisted set. Missing or corrupt data loads as empty;
    /// an unreachable backend switches the store to memory-only.
    pub fn load(&mut self) -> &[u32] {
        match self.read_persisted() {
            Ok(ids) => {
                self.ids = ids;
                self.enforce_cap();
                debug!("Loaded {} favorites from '{}'", self.ids.len(), self.key);
            }
            Err(PersistenceError::Corrupt(e)) => {
                warn!("Discarding corrupt favorites under '{}': {}", self.key, e);
                self.ids.clear();
            }
            Err(e) => {
                warn!(
                    "Favorites storage unavailable, keeping favorites in memory: {}",
                    e
                );
                self.persistent = false;
                self.ids.clear();
            }
        }
        &self.ids
    }

    fn read_persisted(&self) -> Result<Vec<u32>, PersistenceError> {
        let Some(raw) = self.backend.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let stored: Vec<u32> = serde_json::from_str(&raw)?;
        let mut ids = Vec::with_capacity(stored.len());
        for id in stored {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Flips membership and returns whether `id` is now a favorite.
    pub fn toggle(&mut self, id: u32) -> bool {
        if self.is_favorite(id) {
            self.ids.retain(|existing| *existing != id);
            self.save();
            false
        } else {
            self.ids.push(id);
            self.enforce_cap();
            self.save();
            true
        }
    }

    pub fn add(&mut self, id: u32) {
        if self.is_favorite(id) {
            return;
        }
        self.ids.push(id);
        self.enforce_cap();
        self.save();
    }

    pub fn remove(&mut self, id: u32) {
        if !self.is_favorite(id) {
            return;
        }
        self.ids.retain(|existing| *existing != id);
        self.save();
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        if !self.persistent {
            return;
        }
        if let Err(e) = self.backend.remove(&self.key) {
            warn!("Failed to clear favorites, continuing in memory: {}", e);
            self.persistent = false;
        } else {
            info!("Cleared favorites under '{}'", self.key);
        }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn enforce_cap(&mut self) {
        if self.max_entries > 0 && self.ids.len() > self.max_entries {
            let excess = self.ids.len() - self.max_entries;
            let evicted: Vec<u32> = self.ids.drain(..excess).collect();
            debug!("Evicted oldest favorites {:?}", evicted);
        }
    }

    fn save(&mut self) {
        if !self.persistent {
            return;
        }

        let result = serde_json::to_string(&self.ids)
            .map_err(PersistenceError::from)
            .and_then(|json| self.backend.set(&self.key, &json));

        if let Err(e) = result {
            warn!("Failed to save favorites, continuing in memory: {}", e);
            self.persistent = false;
        }
    }
}
