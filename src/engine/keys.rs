use super::Direction;
use serde::{Deserialize, Serialize};

/// Lightbox actions a presentation layer can forward to the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GalleryAction {
    Navigate(Direction),
    Close,
    ToggleInfo,
}

/// Maps a DOM-style key name to its lightbox action.
pub fn action_for_key(key: &str) -> Option<GalleryAction> {
    match key {
        "ArrowRight" => Some(GalleryAction::Navigate(Direction::Next)),
        "ArrowLeft" => Some(GalleryAction::Navigate(Direction::Prev)),
        "Escape" => Some(GalleryAction::Close),
        "i" | "I" => Some(GalleryAction::ToggleInfo),
        _ => None,
    }
}
