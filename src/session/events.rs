//! Input events and controller outcomes

use crate::config::ShapeColor;
use crate::domain::{ExportTarget, Point, Rect, Tool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };

    pub fn control(self) -> bool {
        self.ctrl
    }

    pub fn shift(self) -> bool {
        self.shift
    }
}

/// Toolbar buttons that mirror keyboard shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Undo,
    Save,
    Copy,
    Cancel,
}

/// Everything the host forwards to the selection controller
///
/// Pointer positions are in frame pixels; hosts working in logical units map
/// them with `FrameBuffer::to_physical` first.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(Point, PointerButton),
    PointerMove(Point),
    PointerUp(Point, PointerButton),
    KeyPress(Key, Modifiers),
    ToolSelected(Tool),
    ColorSelected(ShapeColor),
    Toolbar(ToolbarAction),
}

/// What the host should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed
    Ignored,
    /// Show this selection rectangle
    Preview(Rect),
    /// Annotations or the in-progress gesture changed
    Redraw,
    /// Flatten the selection and export it
    Finish(ExportTarget),
    /// Abort the session
    Cancel,
}
