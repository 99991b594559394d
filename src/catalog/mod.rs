// Catalog module - directory-backed image listing
mod core;
mod error;
mod handlers;
mod types;

pub use error::CatalogError;
pub use handlers::{images_handler, portfolio_handler};
pub use types::*;

use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;

pub type SharedCatalog = Arc<CatalogScanner>;

pub struct CatalogScanner {
    pub(crate) config: crate::CatalogConfig,
    pub(crate) dimension_cache: Arc<RwLock<HashMap<PathBuf, CachedDimensions>>>,
}

impl CatalogScanner {
    pub fn new(config: crate::CatalogConfig) -> Self {
        Self {
            config,
            dimension_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn source_directory(&self) -> &std::path::Path {
        &self.config.source_directory
    }
}

pub(crate) fn has_image_extension(file_name: &str, extensions: &[String]) -> bool {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
}
