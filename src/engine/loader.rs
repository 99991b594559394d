use super::CatalogLoadError;
use crate::catalog::{ImageDescriptor, SharedCatalog};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

/// Source of catalog snapshots for the gallery facade.
#[async_trait]
pub trait CatalogLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<ImageDescriptor>, CatalogLoadError>;
    fn name(&self) -> &str;
}

pub type DynCatalogLoader = Arc<dyn CatalogLoader>;

/// Fetches the listing from an `/api/images`-style endpoint.
pub struct HttpCatalogLoader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCatalogLoader {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CatalogLoadError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shutterfolio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CatalogLoader for HttpCatalogLoader {
    async fn load(&self) -> Result<Vec<ImageDescriptor>, CatalogLoadError> {
        debug!("Fetching catalog from {}", self.endpoint);

        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(CatalogLoadError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let images = parse_catalog(&body)?;
        info!("Fetched {} images from {}", images.len(), self.endpoint);
        Ok(images)
    }

    fn name(&self) -> &str {
        "HTTP catalog"
    }
}

/// Lists a local directory in-process, without going through HTTP.
pub struct DirectoryCatalogLoader {
    catalog: SharedCatalog,
}

impl DirectoryCatalogLoader {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogLoader for DirectoryCatalogLoader {
    async fn load(&self) -> Result<Vec<ImageDescriptor>, CatalogLoadError> {
        Ok(self.catalog.list_images().await?)
    }

    fn name(&self) -> &str {
        "Directory catalog"
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Wrapped { images: Vec<WireImage> },
    Bare(Vec<WireImage>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireImage {
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    featured: Option<bool>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl WireImage {
    /// The requested id, if any, and the descriptor with its id still unset.
    fn into_descriptor(self) -> Option<(Option<u32>, ImageDescriptor)> {
        let url = self
            .url
            .or(self.src)
            .or_else(|| self.file_name.clone())
            .filter(|url| !url.trim().is_empty())?;

        let requested = match self.id {
            Some(WireId::Number(n)) => u32::try_from(n).ok(),
            Some(WireId::Text(text)) => text
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .parse()
                .ok(),
            None => None,
        };

        // A lone width or height is useless for layout; keep both or neither
        let (width, height) = match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (Some(w), Some(h)),
            _ => (None, None),
        };

        let image = ImageDescriptor {
            id: 0,
            url,
            file_name: self.file_name,
            title: self.title,
            alt: self.alt,
            width,
            height,
            category: self.category,
            featured: self.featured.unwrap_or(false),
            timestamp: self.timestamp,
        };
        Some((requested, image))
    }
}

/// Decodes a catalog response body: `{"images": [...]}` or a bare array.
///
/// Ids are unique in the result. Entries keep the id they were sent with
/// unless an earlier entry already holds it; the rest get their position + 1,
/// or the lowest free id when that is taken too.
pub fn parse_catalog(body: &str) -> Result<Vec<ImageDescriptor>, CatalogLoadError> {
    let wire = match serde_json::from_str::<CatalogBody>(body)? {
        CatalogBody::Wrapped { images } => images,
        CatalogBody::Bare(images) => images,
    };

    let total = wire.len();
    let entries: Vec<(usize, Option<u32>, ImageDescriptor)> = wire
        .into_iter()
        .enumerate()
        .filter_map(|(position, image)| {
            image
                .into_descriptor()
                .map(|(requested, descriptor)| (position, requested, descriptor))
        })
        .collect();

    if entries.len() < total {
        warn!(
            "Skipped {} catalog entries without a url",
            total - entries.len()
        );
    }

    let mut used: HashSet<u32> = HashSet::with_capacity(entries.len());
    let mut kept: Vec<bool> = Vec::with_capacity(entries.len());
    for (_, requested, _) in &entries {
        kept.push(matches!(requested, Some(id) if used.insert(*id)));
    }

    let mut next_free = 1u32;
    let mut images = Vec::with_capacity(entries.len());
    for ((position, requested, mut image), kept) in entries.into_iter().zip(kept) {
        image.id = match requested {
            Some(id) if kept => id,
            _ => {
                let fallback = u32::try_from(position + 1).unwrap_or(u32::MAX);
                let id = if used.insert(fallback) {
                    fallback
                } else {
                    while used.contains(&next_free) {
                        next_free += 1;
                    }
                    used.insert(next_free);
                    next_free
                };
                if let Some(requested) = requested {
                    warn!(
                        "Catalog id {} for {} is already taken, using {}",
                        requested, image.url, id
                    );
                }
                id
            }
        };
        images.push(image);
    }

    Ok(images)
}
