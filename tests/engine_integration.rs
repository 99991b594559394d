use axum::{Router, http::StatusCode, routing::get};
use image::{ImageBuffer, Rgb};
use shutterfolio::{
    Config, GallerySettings,
    catalog::CatalogScanner,
    create_app,
    engine::{
        CatalogLoadError, CatalogLoader, DirectoryCatalogLoader, FavoritesStore, Gallery,
        HttpCatalogLoader, Selection, SortOrder,
    },
};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb([200u8, 120u8, 40u8]));
    img.save(path).unwrap();
}

fn portfolio_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    let source = temp_dir.path().join("portfolio");
    write_image(&source.join("landscapes").join("dunes.jpg"), 30, 20);
    write_image(&source.join("landscapes").join("fjord.jpg"), 30, 20);
    write_image(&source.join("portraits").join("anna.jpg"), 20, 30);
    write_image(&source.join("studio.jpg"), 20, 20);

    config.catalog.source_directory = source;
    config.catalog.featured_count = 2;
    config.favorites.directory = temp_dir.path().join("data");
    config
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_gallery_over_http_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let config = portfolio_config(&temp_dir);
    let addr = spawn(create_app(config.clone()).await).await;

    let loader = Arc::new(HttpCatalogLoader::new(format!("http://{}/api/images", addr)).unwrap());
    let gallery = Gallery::new(
        loader,
        FavoritesStore::from_config(&config.favorites),
        GallerySettings::default(),
    );

    assert_eq!(gallery.activate().await, Ok(4));
    assert_eq!(
        gallery.categories(),
        vec!["landscapes", "portraits", "photography"]
    );

    gallery.set_category(Some("landscapes".to_string()));
    gallery.set_sort(SortOrder::Featured);
    let images = gallery.images();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|image| image.featured));
    assert_eq!(images[0].dimensions(), Some((30, 20)));
}

#[tokio::test]
async fn test_http_error_status_becomes_error_state() {
    let router = Router::new().route(
        "/api/images",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
    );
    let addr = spawn(router).await;

    let loader = Arc::new(HttpCatalogLoader::new(format!("http://{}/api/images", addr)).unwrap());
    let gallery = Gallery::new(
        loader,
        FavoritesStore::in_memory(50),
        GallerySettings::default(),
    );

    let result = gallery.activate().await;
    assert_eq!(
        result,
        Err(CatalogLoadError::Status {
            status: 503,
            reason: "Service Unavailable".to_string()
        })
    );
    assert_eq!(
        gallery.error().as_deref(),
        Some("Error 503: Service Unavailable")
    );
    assert!(gallery.images().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let router = Router::new().route("/api/images", get(|| async { "<html>not json</html>" }));
    let addr = spawn(router).await;

    let loader = HttpCatalogLoader::new(format!("http://{}/api/images", addr)).unwrap();
    assert!(matches!(
        loader.load().await,
        Err(CatalogLoadError::Parse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let loader = HttpCatalogLoader::new(format!("http://{}/api/images", addr)).unwrap();
    assert!(matches!(
        loader.load().await,
        Err(CatalogLoadError::Transport(_))
    ));
}

#[tokio::test]
async fn test_directory_catalog_ids_are_stable_across_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let config = portfolio_config(&temp_dir);
    let loader = DirectoryCatalogLoader::new(Arc::new(CatalogScanner::new(config.catalog)));

    let first = loader.load().await.unwrap();
    let second = loader.load().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_favorites_survive_a_new_session() {
    let temp_dir = TempDir::new().unwrap();
    let config = portfolio_config(&temp_dir);
    let scanner = Arc::new(CatalogScanner::new(config.catalog.clone()));

    {
        let gallery = Gallery::new(
            Arc::new(DirectoryCatalogLoader::new(scanner.clone())),
            FavoritesStore::from_config(&config.favorites),
            GallerySettings::default(),
        );
        gallery.activate().await.unwrap();
        assert!(gallery.toggle_favorite(3));
        gallery.add_favorite(1);
        assert!(gallery.favorites_persistent());
    }

    let gallery = Gallery::new(
        Arc::new(DirectoryCatalogLoader::new(scanner)),
        FavoritesStore::from_config(&config.favorites),
        GallerySettings::default(),
    );
    gallery.activate().await.unwrap();

    assert_eq!(gallery.favorites(), vec![3, 1]);
    let favorites = gallery.favorite_images();
    assert_eq!(favorites.len(), 2);
    assert_eq!(favorites[0].id, 3);
    assert_eq!(favorites[1].id, 1);
}

#[tokio::test]
async fn test_refresh_after_new_upload_keeps_cursor_contract() {
    let temp_dir = TempDir::new().unwrap();
    let config = portfolio_config(&temp_dir);
    let source = config.catalog.source_directory.clone();
    let gallery = Gallery::new(
        Arc::new(DirectoryCatalogLoader::new(Arc::new(CatalogScanner::new(
            config.catalog,
        )))),
        FavoritesStore::in_memory(10),
        GallerySettings::default(),
    );

    assert_eq!(gallery.activate().await, Ok(4));
    assert!(gallery.select_index(3));

    write_image(&source.join("zebra.jpg"), 20, 20);
    assert_eq!(gallery.activate().await, Ok(4));
    assert_eq!(gallery.refresh().await, Ok(5));

    // The cursor is not corrected after a reload; navigation still wraps
    assert!(matches!(gallery.selection(), Selection::Open { index: 3, .. }));
    assert!(gallery.navigate(shutterfolio::engine::Direction::Next));
    assert!(matches!(gallery.selection(), Selection::Open { index: 4, .. }));
}
