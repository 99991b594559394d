use crate::{Config, catalog::CatalogScanner};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Portfolio source directory does not exist: {0}")]
    SourceDirectoryMissing(String),

    #[error("Portfolio source directory is not readable: {0}")]
    SourceDirectoryUnreadable(String),

    #[error("Failed to create favorites directory: {0}")]
    FavoritesDirectoryCreationFailed(#[from] std::io::Error),
}

impl StartupCheckError {
    /// The server cannot run without its image directory.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::SourceDirectoryMissing(_)
                | StartupCheckError::SourceDirectoryUnreadable(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let source_dir = &config.catalog.source_directory;
    let source_name = source_dir.display().to_string();
    if !tokio::fs::try_exists(source_dir).await.unwrap_or(false) {
        error!("Portfolio source directory does not exist: {:?}", source_dir);
        errors.push(StartupCheckError::SourceDirectoryMissing(source_name));
    } else {
        match tokio::fs::read_dir(source_dir).await {
            Ok(_) => {
                info!("Portfolio source directory is accessible: {:?}", source_dir);
                let scanner = CatalogScanner::new(config.catalog.clone());
                match scanner.count_images().await {
                    Ok(0) => warn!("Portfolio source directory contains no images"),
                    Ok(count) => info!("Portfolio source directory holds {} images", count),
                    Err(e) => warn!("Could not count portfolio images: {}", e),
                }
            }
            Err(e) => {
                error!("Portfolio source directory is not accessible: {}", e);
                errors.push(StartupCheckError::SourceDirectoryUnreadable(source_name));
            }
        }
    }

    let favorites_dir = &config.favorites.directory;
    if !favorites_dir.exists() {
        info!(
            "Favorites directory does not exist, creating: {:?}",
            favorites_dir
        );
        if let Err(e) = tokio::fs::create_dir_all(favorites_dir).await {
            warn!("Failed to create favorites directory: {}", e);
            errors.push(StartupCheckError::FavoritesDirectoryCreationFailed(e));
        } else {
            info!("Favorites directory created successfully");
        }
    } else {
        info!("Favorites directory exists: {:?}", favorites_dir);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
