//! Host collaborators: processes, tool lookup, dialogs and clipboard
//!
//! Every side effect the capture engine, selection controller and export sink
//! need goes through one of these traits so tests can substitute fakes.

pub mod clipboard;
pub mod dialog;
pub mod display;
pub mod locator;
pub mod process;
pub mod prompt;

pub use clipboard::{Clipboard, NativeClipboard};
pub use dialog::{FileChooser, RfdFileChooser};
pub use display::DisplayServer;
pub use locator::{FsToolLocator, ToolLocator};
pub use process::{ProcessCommand, ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use prompt::{DialogPrompt, TextInputPrompt};
