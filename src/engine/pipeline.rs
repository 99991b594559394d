//! Category filter followed by a stable sort, producing the view list.

use crate::catalog::ImageDescriptor;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Featured,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Featured => "featured",
        };
        f.write_str(name)
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "featured" => Ok(SortOrder::Featured),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Filters `catalog` by exact category (none = everything) and sorts the
/// survivors. Equal keys keep their catalog order.
pub fn apply(
    catalog: &[ImageDescriptor],
    category: Option<&str>,
    order: SortOrder,
) -> Vec<ImageDescriptor> {
    let mut result: Vec<ImageDescriptor> = catalog
        .iter()
        .filter(|image| match category {
            Some(wanted) => image.category.as_deref() == Some(wanted),
            None => true,
        })
        .cloned()
        .collect();

    // slice::sort_by is stable
    match order {
        SortOrder::Newest => result.sort_by(|a, b| recency_key(b).cmp(&recency_key(a))),
        SortOrder::Oldest => result.sort_by(|a, b| recency_key(a).cmp(&recency_key(b))),
        SortOrder::Featured => {
            result.sort_by(|a, b| b.featured.cmp(&a.featured).then(a.id.cmp(&b.id)))
        }
    }

    result
}

/// Milliseconds since the epoch when the timestamp parses, otherwise the id.
/// Untimestamped items order among themselves by id.
fn recency_key(image: &ImageDescriptor) -> i64 {
    image
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(image.id as i64)
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Distinct, non-empty categories in first-seen order.
pub fn categories(catalog: &[ImageDescriptor]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in catalog.iter().filter_map(|image| image.category.as_deref()) {
        if !category.is_empty() && !seen.iter().any(|c| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: u32, category: Option<&str>, featured: bool) -> ImageDescriptor {
        let mut image = ImageDescriptor::new(id, format!("/img/{}.jpg", id));
        image.category = category.map(str::to_string);
        image.featured = featured;
        image
    }

    fn ids(images: &[ImageDescriptor]) -> Vec<u32> {
        images.iter().map(|i| i.id).collect()
    }

    fn sample_catalog() -> Vec<ImageDescriptor> {
        vec![
            image(1, Some("a"), false),
            image(2, Some("b"), true),
            image(3, Some("a"), true),
        ]
    }

    #[test]
    fn test_featured_within_category() {
        let result = apply(&sample_catalog(), Some("a"), SortOrder::Featured);
        assert_eq!(ids(&result), vec![3, 1]);
    }

    #[test]
    fn test_no_category_keeps_everything() {
        let mut catalog = sample_catalog();
        catalog.push(image(4, None, false));

        let result = apply(&catalog, None, SortOrder::Oldest);
        assert_eq!(ids(&result), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_category_filter_is_exact_and_case_sensitive() {
        let mut catalog = sample_catalog();
        catalog.push(image(4, Some("A"), false));
        catalog.push(image(5, None, false));

        let result = apply(&catalog, Some("a"), SortOrder::Oldest);
        assert_eq!(ids(&result), vec![1, 3]);

        let result = apply(&catalog, Some("missing"), SortOrder::Newest);
        assert!(result.is_empty());
    }

    #[test]
    fn test_newest_falls_back_to_id() {
        let result = apply(&sample_catalog(), None, SortOrder::Newest);
        assert_eq!(ids(&result), vec![3, 2, 1]);
    }

    #[test]
    fn test_newest_prefers_timestamps() {
        let mut catalog = sample_catalog();
        catalog[0].timestamp = Some("2024-05-01T10:00:00Z".to_string());
        catalog[1].timestamp = Some("2023-01-01T10:00:00+00:00".to_string());
        catalog[2].timestamp = Some("2024-06-01".to_string());

        let newest = apply(&catalog, None, SortOrder::Newest);
        assert_eq!(ids(&newest), vec![3, 1, 2]);

        let oldest = apply(&catalog, None, SortOrder::Oldest);
        assert_eq!(ids(&oldest), vec![2, 1, 3]);
    }

    #[test]
    fn test_unparseable_timestamp_uses_id() {
        let mut catalog = sample_catalog();
        catalog[2].timestamp = Some("last tuesday".to_string());

        let result = apply(&catalog, None, SortOrder::Newest);
        assert_eq!(ids(&result), vec![3, 2, 1]);
    }

    #[test]
    fn test_equal_keys_keep_catalog_order() {
        let mut catalog = vec![image(7, None, false), image(7, None, false)];
        catalog[0].url = "/first.jpg".to_string();
        catalog[1].url = "/second.jpg".to_string();

        for order in [SortOrder::Newest, SortOrder::Oldest, SortOrder::Featured] {
            let result = apply(&catalog, None, order);
            assert_eq!(result[0].url, "/first.jpg");
            assert_eq!(result[1].url, "/second.jpg");
        }
    }

    #[test]
    fn test_featured_groups_are_ordered_by_id() {
        let catalog = vec![
            image(5, None, false),
            image(4, None, true),
            image(1, None, false),
            image(2, None, true),
        ];
        let result = apply(&catalog, None, SortOrder::Featured);
        assert_eq!(ids(&result), vec![2, 4, 1, 5]);

        let first_plain = result.iter().position(|i| !i.featured).unwrap();
        assert!(result[first_plain..].iter().all(|i| !i.featured));
    }

    #[test]
    fn test_apply_does_not_touch_catalog() {
        let catalog = sample_catalog();
        let before = catalog.clone();
        let _ = apply(&catalog, Some("b"), SortOrder::Featured);
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_categories_first_seen_order() {
        let mut catalog = sample_catalog();
        catalog.push(image(4, None, false));
        catalog.push(image(5, Some(""), false));
        catalog.push(image(6, Some("c"), false));
        assert_eq!(categories(&catalog), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("Featured".parse::<SortOrder>(), Ok(SortOrder::Featured));
        assert!("random".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Oldest.to_string(), "oldest");
    }
}
