use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Rendering layout applied to the view list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grid,
    #[default]
    Masonry,
    Collage,
    Carousel,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewMode::Grid => "grid",
            ViewMode::Masonry => "masonry",
            ViewMode::Collage => "collage",
            ViewMode::Carousel => "carousel",
        };
        f.write_str(name)
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "masonry" => Ok(ViewMode::Masonry),
            "collage" => Ok(ViewMode::Collage),
            "carousel" => Ok(ViewMode::Carousel),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewModeController {
    mode: ViewMode,
}

impl ViewModeController {
    pub fn new(mode: ViewMode) -> Self {
        Self { mode }
    }

    pub fn get(&self) -> ViewMode {
        self.mode
    }

    /// Returns true when the mode actually changed.
    pub fn set(&mut self, mode: ViewMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }
}
