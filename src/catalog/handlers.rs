use super::{CatalogError, CatalogResponse, PortfolioEntry};
use crate::AppState;
use axum::{Json, extract::State};
use tracing::error;

/// `GET /api/images` - full descriptors wrapped in `{"images": [...]}`.
pub async fn images_handler(
    State(app_state): State<AppState>,
) -> Result<Json<CatalogResponse>, CatalogError> {
    match app_state.catalog.list_images().await {
        Ok(images) => Ok(Json(CatalogResponse { images })),
        Err(e) => {
            error!("Error fetching portfolio images: {}", e);
            Err(e)
        }
    }
}

/// `GET /api/portfolio` - bare array of file names, sizes and aspect classes.
pub async fn portfolio_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<PortfolioEntry>>, CatalogError> {
    let images = app_state.catalog.list_images().await.map_err(|e| {
        error!("Error fetching portfolio listing: {}", e);
        e
    })?;

    Ok(Json(images.iter().map(PortfolioEntry::from).collect()))
}
