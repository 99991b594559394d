//! Query-string formatting for resized and placeholder image URLs.
//!
//! This only builds URLs; nothing here talks to an image service.

use std::fmt;
use url::form_urlencoded;

const BREAKPOINTS: [u32; 6] = [640, 768, 1024, 1280, 1536, 1920];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Webp,
    Jpeg,
    Png,
    Avif,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Avif => "avif",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub format: Option<ImageFormat>,
    pub blur: Option<u32>,
}

impl TransformOptions {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(width) = self.width {
            params.push(("w", width.to_string()));
        }
        if let Some(height) = self.height {
            params.push(("h", height.to_string()));
        }
        if let Some(quality) = self.quality {
            params.push(("q", quality.to_string()));
        }
        if let Some(format) = self.format {
            params.push(("fm", format.to_string()));
        }
        if let Some(blur) = self.blur {
            params.push(("blur", blur.to_string()));
        }
        params
    }
}

/// Adds `params` to the query of `src`, keeping any `#fragment` last.
fn append_query(src: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return src.to_string();
    }

    let (base, fragment) = match src.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (src, None),
    };

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())))
        .finish();

    let separator = match base.split_once('?') {
        Some((_, "")) => "",
        Some(_) => "&",
        None => "?",
    };

    match fragment {
        Some(fragment) => format!("{}{}{}#{}", base, separator, query, fragment),
        None => format!("{}{}{}", base, separator, query),
    }
}

/// Appends transformation parameters to `src`. Absolute URLs that are not
/// under `base_url` are returned untouched.
pub fn transformed_url(src: &str, options: &TransformOptions, base_url: &str) -> String {
    if src.starts_with("http") && (base_url.is_empty() || !src.starts_with(base_url)) {
        return src.to_string();
    }
    append_query(src, &options.query_params())
}

/// Tiny blurred variant used while the full image loads.
pub fn placeholder_url(src: &str) -> String {
    append_query(
        src,
        &[
            ("w", "40".to_string()),
            ("q", "20".to_string()),
            ("blur", "10".to_string()),
        ],
    )
}

/// `srcset` value covering every breakpoint up to the image's own width.
pub fn responsive_srcset(src: &str, width: u32, quality: u8) -> String {
    BREAKPOINTS
        .iter()
        .filter(|bp| **bp <= width)
        .map(|bp| {
            let options = TransformOptions {
                width: Some(*bp),
                quality: Some(quality),
                ..TransformOptions::default()
            };
            format!("{} {}w", transformed_url(src, &options, ""), bp)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
