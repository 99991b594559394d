use crate::layout::AspectRatio;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::SystemTime};

/// One displayable photograph as seen by clients of the catalog.
///
/// `id` is assigned by listing position and is only unique within one catalog
/// snapshot. `width` and `height` are either both present or both absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub id: u32,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ImageDescriptor {
    pub fn new(id: u32, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            file_name: None,
            title: None,
            alt: None,
            width: None,
            height: None,
            category: None,
            featured: false,
            timestamp: None,
        }
    }

    /// Measured dimensions, only when both sides are known and non-zero.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Some((width, height)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub images: Vec<ImageDescriptor>,
}

/// Compact listing served by `/api/portfolio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub file_name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: AspectRatio,
}

impl From<&ImageDescriptor> for PortfolioEntry {
    fn from(image: &ImageDescriptor) -> Self {
        let (width, height) = crate::layout::layout_box(image);
        Self {
            file_name: image.file_name.clone().unwrap_or_default(),
            width: image.width,
            height: image.height,
            aspect_ratio: AspectRatio::classify(width, height),
        }
    }
}

// Internal types
#[derive(Debug, Clone)]
pub(crate) struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub file_name: String,
    pub category: Option<String>,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CachedDimensions {
    pub modified: Option<SystemTime>,
    pub dimensions: Option<(u32, u32)>,
}
