//! Aspect-ratio geometry shared by the catalog listing and layout consumers.
//!
//! Everything here works from measured dimensions. Images without dimensions
//! are laid out in a 1:1 box.

use crate::catalog::ImageDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Portrait,
    Square,
    Landscape,
}

impl AspectRatio {
    /// Below 0.9 is portrait, above 1.1 landscape, anything between square.
    pub fn classify(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectRatio::Square;
        }

        let ratio = width as f64 / height as f64;
        if ratio < 0.9 {
            AspectRatio::Portrait
        } else if ratio > 1.1 {
            AspectRatio::Landscape
        } else {
            AspectRatio::Square
        }
    }
}

/// Dimensions to lay an image out with: measured when known, else a unit square.
pub fn layout_box(image: &ImageDescriptor) -> (u32, u32) {
    image.dimensions().unwrap_or((1, 1))
}

/// Snaps a ratio to a common label such as "16/9", falling back to the
/// reduced fraction.
pub fn ratio_label(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "1/1".to_string();
    }

    let ratio = width as f64 / height as f64;
    if ratio > 0.9 && ratio < 1.1 {
        "1/1".to_string()
    } else if ratio > 1.7 && ratio < 1.9 {
        "16/9".to_string()
    } else if ratio > 1.3 && ratio < 1.4 {
        "4/3".to_string()
    } else if ratio < 0.8 {
        "3/4".to_string()
    } else if ratio > 2.0 {
        "21/9".to_string()
    } else {
        let divisor = gcd(width, height);
        format!("{}/{}", width / divisor, height / divisor)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Scales `(width, height)` to a target width or height keeping the ratio.
/// When both targets are given they are used as-is.
pub fn scale_to(
    width: u32,
    height: u32,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (
            target_width.unwrap_or(width),
            target_height.unwrap_or(height),
        );
    }

    let ratio = width as f64 / height as f64;
    match (target_width, target_height) {
        (None, None) => (width, height),
        (Some(w), None) => (w, (w as f64 / ratio).round() as u32),
        (None, Some(h)) => ((h as f64 * ratio).round() as u32, h),
        (Some(w), Some(h)) => (w, h),
    }
}

/// Largest box with the given width/height `ratio` that fits the container.
pub fn fit_within(container_width: f64, container_height: f64, ratio: f64) -> (f64, f64) {
    if ratio <= 0.0 {
        return (container_width, container_height);
    }

    let mut width = container_width;
    let mut height = container_width / ratio;

    if height > container_height {
        height = container_height;
        width = container_height * ratio;
    }

    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bands() {
        assert_eq!(AspectRatio::classify(800, 1200), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(1000, 1000), AspectRatio::Square);
        assert_eq!(AspectRatio::classify(1050, 1000), AspectRatio::Square);
        assert_eq!(AspectRatio::classify(1600, 900), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(0, 900), AspectRatio::Square);
    }

    #[test]
    fn test_layout_box_defaults_to_square() {
        let mut image = ImageDescriptor::new(1, "/a.jpg");
        assert_eq!(layout_box(&image), (1, 1));

        image.width = Some(300);
        assert_eq!(layout_box(&image), (1, 1));

        image.height = Some(200);
        assert_eq!(layout_box(&image), (300, 200));
    }

    #[test]
    fn test_ratio_label() {
        assert_eq!(ratio_label(1000, 1000), "1/1");
        assert_eq!(ratio_label(1920, 1080), "16/9");
        assert_eq!(ratio_label(1333, 1000), "4/3");
        assert_eq!(ratio_label(600, 900), "3/4");
        assert_eq!(ratio_label(2520, 1080), "21/9");
        assert_eq!(ratio_label(1500, 1000), "3/2");
        assert_eq!(ratio_label(0, 10), "1/1");
    }

    #[test]
    fn test_scale_to() {
        assert_eq!(scale_to(1600, 900, None, None), (1600, 900));
        assert_eq!(scale_to(1600, 900, Some(800), None), (800, 450));
        assert_eq!(scale_to(1600, 900, None, Some(450)), (800, 450));
        assert_eq!(scale_to(1600, 900, Some(10), Some(10)), (10, 10));
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(1000.0, 1000.0, 2.0), (1000.0, 500.0));
        assert_eq!(fit_within(1000.0, 400.0, 2.0), (800.0, 400.0));
    }
}
