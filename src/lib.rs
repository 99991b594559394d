use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod catalog;
pub mod engine;
pub mod image_urls;
pub mod layout;
pub mod startup_checks;

use engine::{SortOrder, ViewMode};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub favorites: FavoritesConfig,
    #[serde(default)]
    pub gallery: GallerySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

/// Where the portfolio images live and how they are described to clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub source_directory: PathBuf,
    /// URL path the image files are served under.
    pub url_prefix: String,
    /// Category for files sitting directly in the source directory.
    pub default_category: Option<String>,
    /// The first `featured_count` images (in listing order) are flagged featured.
    pub featured_count: usize,
    /// Directory depth to walk; nested directory names become categories.
    pub max_depth: usize,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub directory: PathBuf,
    pub key: String,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GallerySettings {
    pub catalog_endpoint: String,
    pub default_view_mode: ViewMode,
    pub default_sort: SortOrder,
    pub enable_cache: bool,
    pub shuffle_on_load: bool,
    pub shuffle_on_view_change: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Shutterfolio".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("public/material/portfolio"),
            url_prefix: "/material/portfolio".to_string(),
            default_category: Some("photography".to_string()),
            featured_count: 5,
            max_depth: 2,
            extensions: ["jpg", "jpeg", "png", "webp", "gif", "avif"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            key: "portfolio-favorites".to_string(),
            max_entries: 50,
        }
    }
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            catalog_endpoint: "http://127.0.0.1:3000/api/images".to_string(),
            default_view_mode: ViewMode::Masonry,
            default_sort: SortOrder::Newest,
            enable_cache: true,
            shuffle_on_load: false,
            shuffle_on_view_change: true,
        }
    }
}

use axum::Router;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub catalog: catalog::SharedCatalog,
    pub config: Config,
}

pub async fn create_app(config: Config) -> Router {
    let catalog = Arc::new(catalog::CatalogScanner::new(config.catalog.clone()));

    let app_state = AppState {
        catalog,
        config: config.clone(),
    };

    let images = ServeDir::new(&config.catalog.source_directory);
    let prefix = config.catalog.url_prefix.trim_end_matches('/');

    let router = Router::new()
        .route(
            "/api/images",
            axum::routing::get(catalog::images_handler),
        )
        .route(
            "/api/portfolio",
            axum::routing::get(catalog::portfolio_handler),
        );

    // axum refuses to nest at the root, so an empty prefix serves images as the fallback
    let router = if prefix.is_empty() {
        router.fallback_service(images)
    } else {
        router.nest_service(prefix, images)
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        query = ?request.uri().query(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
