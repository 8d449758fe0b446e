//! Selection session types: state, tools and export targets

use serde::{Deserialize, Serialize};

/// Phase of the interactive selection state machine
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Waiting for the first pointer press
    #[default]
    Idle,
    /// Dragging out the selection rectangle
    Selecting,
    /// Region locked in; tools may be used inside it
    Selected,
    /// A draw gesture is in progress inside the locked region
    Drawing,
}

/// Active annotation tool
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    None,
    Rectangle,
    Ellipse,
    Arrow,
    Freehand,
    Text,
    Mosaic,
}

impl Tool {
    /// Whether the tool draws through a press-drag-release gesture
    pub fn is_gesture(self) -> bool {
        matches!(
            self,
            Tool::Rectangle | Tool::Ellipse | Tool::Arrow | Tool::Freehand | Tool::Mosaic
        )
    }
}

/// Where a finished screenshot goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportTarget {
    /// Copy to clipboard only
    Clipboard,
    /// Save through the file chooser
    File,
}
