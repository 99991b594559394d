use thiserror::Error;

/// Failure fetching or decoding the image catalog.
///
/// The display string is what a presentation layer shows to the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogLoadError {
    #[error("Error {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed catalog response: {0}")]
    Parse(String),

    #[error("Catalog scan failed: {0}")]
    Scan(String),
}

impl From<serde_json::Error> for CatalogLoadError {
    fn from(e: serde_json::Error) -> Self {
        CatalogLoadError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for CatalogLoadError {
    fn from(e: reqwest::Error) -> Self {
        CatalogLoadError::Transport(e.to_string())
    }
}

impl From<crate::catalog::CatalogError> for CatalogLoadError {
    fn from(e: crate::catalog::CatalogError) -> Self {
        CatalogLoadError::Scan(e.to_string())
    }
}

/// Favorites persistence could not read or write. Never surfaced past the store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt stored value: {0}")]
    Corrupt(#[from] serde_json::Error),
}
