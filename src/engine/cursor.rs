//! Which single image is open in the lightbox, and where it sits in the list.

use crate::catalog::ImageDescriptor;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Closed,
    Open {
        item: ImageDescriptor,
        index: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCursor {
    selection: Selection,
    show_info: bool,
}

impl SelectionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `item` at `index`. The caller guarantees `list[index] == item`.
    pub fn select(&mut self, item: ImageDescriptor, index: usize) {
        self.selection = Selection::Open { item, index };
    }

    pub fn close(&mut self) {
        self.selection = Selection::Closed;
        self.show_info = false;
    }

    /// Moves to the neighbouring item with wraparound. Returns whether the
    /// cursor moved; closed cursors, empty lists and stale indices are no-ops.
    pub fn navigate(&mut self, direction: Direction, list: &[ImageDescriptor]) -> bool {
        let Selection::Open { index, .. } = &self.selection else {
            debug!("Ignoring {:?} navigation while closed", direction);
            return false;
        };

        let len = list.len();
        if len == 0 || *index >= len {
            debug!(
                "Ignoring {:?} navigation from index {} over {} items",
                direction, index, len
            );
            return false;
        }

        let next_index = match direction {
            Direction::Next => (index + 1) % len,
            Direction::Prev => (index + len - 1) % len,
        };

        self.selection = Selection::Open {
            item: list[next_index].clone(),
            index: next_index,
        };
        true
    }

    pub fn toggle_info(&mut self) -> bool {
        self.show_info = !self.show_info;
        self.show_info
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_open(&self) -> bool {
        matches!(self.selection, Selection::Open { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match &self.selection {
            Selection::Open { index, .. } => Some(*index),
            Selection::Closed => None,
        }
    }

    pub fn item(&self) -> Option<&ImageDescriptor> {
        match &self.selection {
            Selection::Open { item, .. } => Some(item),
            Selection::Closed => None,
        }
    }

    pub fn show_info(&self) -> bool {
        self.show_info
    }
}
