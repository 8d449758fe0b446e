use crate::domain::ExportTarget;
use crate::session::events::{Key, Modifiers};

/// Action bound to a key combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Cancel,
    Finish(ExportTarget),
    Undo,
}

pub fn handle_key_event(key: Key, modifiers: Modifiers) -> Option<Shortcut> {
    match key {
        Key::Escape => Some(Shortcut::Cancel),
        // Enter copies, with or without modifiers
        Key::Enter => Some(Shortcut::Finish(ExportTarget::Clipboard)),
        Key::Character(c)
            if c.eq_ignore_ascii_case(&'z') && modifiers.control() && !modifiers.shift() =>
        {
            Some(Shortcut::Undo)
        }
        Key::Character(c) if c.eq_ignore_ascii_case(&'c') && modifiers.control() => {
            Some(Shortcut::Finish(ExportTarget::Clipboard))
        }
        Key::Character(c) if c.eq_ignore_ascii_case(&'s') && modifiers.control() => {
            Some(Shortcut::Finish(ExportTarget::File))
        }
        _ => None,
    }
}
