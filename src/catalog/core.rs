use super::{
    CachedDimensions, CatalogError, CatalogScanner, ImageDescriptor, ScannedFile,
    has_image_extension,
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

impl CatalogScanner {
    /// Lists every image under the source directory as a fresh catalog snapshot.
    pub async fn list_images(&self) -> Result<Vec<ImageDescriptor>, CatalogError> {
        let root = self.config.source_directory.clone();

        debug!("Listing catalog images under {:?}", root);

        if !tokio::fs::try_exists(&root).await? {
            return Err(CatalogError::NotFound);
        }

        let max_depth = self.config.max_depth.max(1);
        let extensions = self.config.extensions.clone();
        let default_category = self.config.default_category.clone();

        let files = tokio::task::spawn_blocking(move || {
            collect_image_files(&root, max_depth, &extensions, default_category.as_deref())
        })
        .await??;

        let mut images = Vec::with_capacity(files.len());
        for (position, file) in files.iter().enumerate() {
            let dimensions = self.measure(file).await;
            images.push(self.describe(position, file, dimensions));
        }

        let scanned: HashSet<&PathBuf> = files.iter().map(|file| &file.path).collect();
        self.dimension_cache
            .write()
            .await
            .retain(|path, _| scanned.contains(path));

        info!("Catalog listing found {} images", images.len());
        Ok(images)
    }

    async fn measure(&self, file: &ScannedFile) -> Option<(u32, u32)> {
        if let Some(cached) = self.dimension_cache.read().await.get(&file.path)
            && cached.modified == file.modified
        {
            return cached.dimensions;
        }

        let path = file.path.clone();
        let measured = match tokio::task::spawn_blocking(move || image::image_dimensions(&path))
            .await
        {
            Ok(Ok((width, height))) if width > 0 && height > 0 => Some((width, height)),
            Ok(Ok(_)) => {
                warn!("Image {:?} reports zero dimensions", file.path);
                None
            }
            Ok(Err(e)) => {
                warn!("Failed to read dimensions of {:?}: {}", file.path, e);
                None
            }
            Err(e) => {
                warn!("Dimension probe for {:?} did not complete: {}", file.path, e);
                None
            }
        };

        self.dimension_cache.write().await.insert(
            file.path.clone(),
            CachedDimensions {
                modified: file.modified,
                dimensions: measured,
            },
        );

        measured
    }

    fn describe(
        &self,
        position: usize,
        file: &ScannedFile,
        dimensions: Option<(u32, u32)>,
    ) -> ImageDescriptor {
        let stem = Path::new(&file.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file.file_name.clone());

        let encoded_path = file
            .relative_path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        ImageDescriptor {
            id: u32::try_from(position + 1).unwrap_or(u32::MAX),
            url: format!(
                "{}/{}",
                self.config.url_prefix.trim_end_matches('/'),
                encoded_path
            ),
            file_name: Some(file.file_name.clone()),
            alt: Some(format!("Photography work - {}", stem)),
            title: Some(stem),
            width: dimensions.map(|d| d.0),
            height: dimensions.map(|d| d.1),
            category: file.category.clone(),
            featured: position < self.config.featured_count,
            timestamp: file
                .modified
                .map(|modified| DateTime::<Utc>::from(modified).to_rfc3339()),
        }
    }

    pub async fn count_images(&self) -> Result<usize, CatalogError> {
        let root = self.config.source_directory.clone();
        let max_depth = self.config.max_depth.max(1);
        let extensions = self.config.extensions.clone();

        let files =
            tokio::task::spawn_blocking(move || collect_image_files(&root, max_depth, &extensions, None))
                .await??;

        Ok(files.len())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Walks `root` and returns the image files sorted by relative path, so that
/// positional ids stay the same for an unchanged directory.
pub(crate) fn collect_image_files(
    root: &Path,
    max_depth: usize,
    extensions: &[String],
    default_category: Option<&str>,
) -> Result<Vec<ScannedFile>, CatalogError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself failing means there is no listing at all
            Err(e) if e.depth() == 0 || e.path() == Some(root) => return Err(e.into()),
            Err(e) => {
                warn!("Skipping unreadable catalog entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !has_image_extension(&file_name, extensions) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| CatalogError::InvalidPath)?;
        let components: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        let category = if components.len() > 1 {
            Some(components[0].clone())
        } else {
            default_category.map(str::to_string)
        };

        files.push(ScannedFile {
            path: entry.path().to_path_buf(),
            relative_path: components.join("/"),
            file_name,
            category,
            modified: entry.metadata().ok().and_then(|m| m.modified().ok()),
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogConfig;
    use axum::{http::StatusCode, response::IntoResponse};
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_image(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 128])
        });
        img.save(path).unwrap();
    }

    fn scanner_for(dir: &TempDir) -> CatalogScanner {
        CatalogScanner::new(CatalogConfig {
            source_directory: dir.path().to_path_buf(),
            featured_count: 2,
            ..CatalogConfig::default()
        })
    }

    #[tokio::test]
    async fn test_list_images_assigns_ids_by_sorted_path() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("c_wide.jpg"), 160, 90);
        write_image(&dir.path().join("a_tall.png"), 40, 60);
        write_image(&dir.path().join("b_square.jpg"), 50, 50);

        let images = scanner_for(&dir).list_images().await.unwrap();

        let names: Vec<_> = images
            .iter()
            .map(|i| i.file_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["a_tall.png", "b_square.jpg", "c_wide.jpg"]);
        assert_eq!(
            images.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(images[0].featured);
        assert!(images[1].featured);
        assert!(!images[2].featured);
    }

    #[tokio::test]
    async fn test_list_images_measures_dimensions() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("wide.png"), 160, 90);

        let images = scanner_for(&dir).list_images().await.unwrap();
        assert_eq!(images[0].dimensions(), Some((160, 90)));
        assert_eq!(images[0].title.as_deref(), Some("wide"));
        assert_eq!(images[0].alt.as_deref(), Some("Photography work - wide"));
        assert_eq!(images[0].url, "/material/portfolio/wide.png");
        assert!(images[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_unreadable_image_has_no_dimensions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not really a jpeg").unwrap();

        let images = scanner_for(&dir).list_images().await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].width, None);
        assert_eq!(images[0].height, None);
    }

    #[tokio::test]
    async fn test_skips_hidden_and_non_image_files() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("keep.jpg"), 10, 10);
        write_image(&dir.path().join(".hidden.jpg"), 10, 10);
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join(".cache")).unwrap();
        write_image(&dir.path().join(".cache").join("thumb.jpg"), 10, 10);

        let images = scanner_for(&dir).list_images().await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name.as_deref(), Some("keep.jpg"));
    }

    #[tokio::test]
    async fn test_nested_directories_become_categories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("street")).unwrap();
        write_image(&dir.path().join("street").join("night walk.jpg"), 30, 20);
        write_image(&dir.path().join("root.jpg"), 20, 20);

        let images = scanner_for(&dir).list_images().await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].category.as_deref(), Some("photography"));
        assert_eq!(images[1].category.as_deref(), Some("street"));
        assert_eq!(images[1].url, "/material/portfolio/street/night%20walk.jpg");
    }

    #[tokio::test]
    async fn test_missing_source_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let scanner = CatalogScanner::new(CatalogConfig {
            source_directory: dir.path().join("missing"),
            ..CatalogConfig::default()
        });

        let result = scanner.list_images().await;
        assert!(matches!(result, Err(CatalogError::NotFound)));
    }

    #[tokio::test]
    async fn test_dimension_cache_is_refreshed_when_file_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        write_image(&path, 20, 10);

        let scanner = scanner_for(&dir);
        let first = scanner.list_images().await.unwrap();
        assert_eq!(first[0].dimensions(), Some((20, 10)));
        assert_eq!(scanner.dimension_cache.read().await.len(), 1);

        // Force a different mtime so the cached entry no longer matches
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_image(&path, 10, 40);
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(5))
            .unwrap();

        let second = scanner.list_images().await.unwrap();
        assert_eq!(second[0].dimensions(), Some((10, 40)));
    }

    #[tokio::test]
    async fn test_dimension_cache_drops_removed_files() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("keep.png"), 10, 10);
        write_image(&dir.path().join("gone.png"), 10, 10);

        let scanner = scanner_for(&dir);
        scanner.list_images().await.unwrap();
        assert_eq!(scanner.dimension_cache.read().await.len(), 2);

        std::fs::remove_file(dir.path().join("gone.png")).unwrap();
        let images = scanner.list_images().await.unwrap();
        assert_eq!(images.len(), 1);

        let cache = scanner.dimension_cache.read().await;
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&dir.path().join("keep.png")));
    }

    #[test]
    fn test_unwalkable_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("vanished");

        let result = collect_image_files(&root, 3, &["jpg".to_string()], None);
        let err = result.unwrap_err();
        assert!(matches!(err, CatalogError::WalkError(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_count_images() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("one.jpg"), 10, 10);
        write_image(&dir.path().join("two.jpg"), 10, 10);
        std::fs::write(dir.path().join("readme.md"), "# hi").unwrap();

        assert_eq!(scanner_for(&dir).count_images().await.unwrap(), 2);
    }
}
