//! Exporting flattened screenshots
//!
//! This module contains:
//! - Encoding and the ranked list of save locations (file.rs)
//! - Clipboard copy with a `wl-copy` fallback (clipboard.rs)
//!
//! File and clipboard exports are independent: one failing never prevents
//! the other.

pub mod clipboard;
pub mod file;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use serde::Serialize;

use crate::config::Config;
use crate::error::ExportError;
use crate::platform::{Clipboard, DisplayServer, ProcessRunner, ToolLocator};

pub use file::SaveFormat;

/// Which exports to perform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    /// Write the bitmap to disk
    pub save: bool,
    /// Preferred path; the default save locations are used when absent or unwritable
    pub path: Option<PathBuf>,
    pub clipboard: bool,
}

/// Outcome of each requested export; `None` when it was not requested
#[derive(Debug, Default)]
pub struct ExportReport {
    pub file: Option<Result<PathBuf, ExportError>>,
    /// Name of the clipboard strategy that succeeded
    pub clipboard: Option<Result<String, ExportError>>,
}

impl ExportReport {
    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.file.as_ref().and_then(|result| result.as_ref().ok())
    }

    pub fn any_succeeded(&self) -> bool {
        matches!(self.file, Some(Ok(_))) || matches!(self.clipboard, Some(Ok(_)))
    }

    /// True when something was requested and nothing worked
    pub fn all_failed(&self) -> bool {
        let requested = self.file.is_some() || self.clipboard.is_some();
        requested && !self.any_succeeded()
    }

    pub fn summary(&self) -> ExportSummary {
        let (file, file_error) = split(&self.file);
        let (clipboard, clipboard_error) = split(&self.clipboard);
        ExportSummary {
            file,
            file_error,
            clipboard,
            clipboard_error,
        }
    }
}

fn split<T: Clone>(result: &Option<Result<T, ExportError>>) -> (Option<T>, Option<String>) {
    match result {
        Some(Ok(value)) => (Some(value.clone()), None),
        Some(Err(err)) => (None, Some(err.to_string())),
        None => (None, None),
    }
}

/// Serializable form of an [`ExportReport`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard_error: Option<String>,
}

/// Writes bitmaps to disk and to the clipboard
pub struct ExportSink {
    display_server: DisplayServer,
    clipboard_fallback: bool,
    clipboard_timeout: Duration,
    runner: Arc<dyn ProcessRunner>,
    locator: Arc<dyn ToolLocator>,
    clipboard: Box<dyn Clipboard>,
    save_dirs: Vec<PathBuf>,
}

impl ExportSink {
    pub fn new(
        config: &Config,
        display_server: DisplayServer,
        runner: Arc<dyn ProcessRunner>,
        locator: Arc<dyn ToolLocator>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        Self {
            display_server,
            clipboard_fallback: config.clipboard_fallback,
            clipboard_timeout: config.clipboard_timeout(),
            runner,
            locator,
            clipboard,
            save_dirs: file::default_save_dirs(),
        }
    }

    /// Replace the fallback directories tried for generated file names
    pub fn with_save_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.save_dirs = dirs;
        self
    }

    pub fn save_dirs(&self) -> &[PathBuf] {
        &self.save_dirs
    }

    /// Run every requested export and report each result
    pub fn export(&self, bitmap: &RgbaImage, request: &ExportRequest) -> ExportReport {
        let file = request
            .save
            .then(|| self.export_to_file(bitmap, request.path.as_deref()));
        if let Some(Err(err)) = &file {
            log::error!("Saving screenshot failed: {}", err);
        }

        let written = file
            .as_ref()
            .and_then(|result| result.as_ref().ok())
            .map(PathBuf::as_path);
        let clipboard = request
            .clipboard
            .then(|| self.export_to_clipboard(bitmap, written));
        if let Some(Err(err)) = &clipboard {
            log::error!("Copying screenshot failed: {}", err);
        }

        ExportReport { file, clipboard }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::platform::{ProcessCommand, ProcessOutput};
    use image::Rgba;
    use std::cell::{Cell, RefCell};
    use std::path::Path;

    /// Clipboard that succeeds or fails on demand and counts calls
    pub(crate) struct FakeClipboard {
        pub works: bool,
        pub calls: std::rc::Rc<Cell<u32>>,
    }

    impl FakeClipboard {
        pub fn new(works: bool) -> Self {
            Self {
                works,
                calls: Default::default(),
            }
        }
    }

    impl Clipboard for FakeClipboard {
        fn set_image(&self, _image: &RgbaImage) -> anyhow::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.works {
                Ok(())
            } else {
                anyhow::bail!("no clipboard owner")
            }
        }
    }

    pub(crate) struct Installed(pub Vec<&'static str>);

    impl ToolLocator for Installed {
        fn exists(&self, path: &Path) -> bool {
            self.0
                .iter()
                .any(|program| Path::new("/usr/bin").join(program) == path)
        }

        fn search_dirs(&self) -> Vec<PathBuf> {
            vec![PathBuf::from("/usr/bin")]
        }
    }

    /// Records commands and whether their stdin file existed while running
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub exit_code: i32,
        pub commands: RefCell<Vec<ProcessCommand>>,
        pub stdin_existed: Cell<bool>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(
            &self,
            command: &ProcessCommand,
            _timeout: Duration,
        ) -> Result<ProcessOutput, ProcessError> {
            if let Some(stdin) = &command.stdin_file {
                self.stdin_existed.set(std::fs::metadata(stdin).is_ok_and(|m| m.len() > 0));
            }
            self.commands.borrow_mut().push(command.clone());
            Ok(ProcessOutput {
                exit_code: Some(self.exit_code),
                ..Default::default()
            })
        }
    }

    pub(crate) fn bitmap() -> RgbaImage {
        RgbaImage::from_pixel(6, 4, Rgba([10, 200, 30, 255]))
    }

    pub(crate) fn sink(
        display: DisplayServer,
        clipboard: FakeClipboard,
        runner: Arc<RecordingRunner>,
        installed: Vec<&'static str>,
        save_dirs: Vec<PathBuf>,
    ) -> ExportSink {
        ExportSink::new(
            &Config::default(),
            display,
            runner,
            Arc::new(Installed(installed)),
            Box::new(clipboard),
        )
        .with_save_dirs(save_dirs)
    }

    #[test]
    fn file_failure_does_not_block_clipboard() {
        let sink = sink(
            DisplayServer::X11,
            FakeClipboard::new(true),
            Arc::default(),
            Vec::new(),
            vec![PathBuf::from("/nonexistent/snapmark-test")],
        );
        let report = sink.export(
            &bitmap(),
            &ExportRequest {
                save: true,
                path: None,
                clipboard: true,
            },
        );

        assert!(matches!(
            report.file,
            Some(Err(ExportError::NoWritableLocation { .. }))
        ));
        assert_eq!(report.clipboard.as_ref().unwrap().as_deref().ok(), Some("native"));
        assert!(report.any_succeeded());
        assert!(!report.all_failed());
    }

    #[test]
    fn clipboard_failure_does_not_block_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(
            DisplayServer::X11,
            FakeClipboard::new(false),
            Arc::default(),
            Vec::new(),
            vec![dir.path().to_path_buf()],
        );
        let report = sink.export(
            &bitmap(),
            &ExportRequest {
                save: true,
                path: None,
                clipboard: true,
            },
        );

        let saved = report.saved_path().unwrap();
        assert!(saved.starts_with(dir.path()));
        assert!(saved.exists());
        assert!(matches!(
            report.clipboard,
            Some(Err(ExportError::ClipboardUnavailable { .. }))
        ));

        let summary = report.summary();
        assert_eq!(summary.file.as_ref(), Some(saved));
        assert!(summary.clipboard_error.is_some());
        assert!(summary.file_error.is_none());
    }

    #[test]
    fn nothing_requested_is_not_a_failure() {
        let sink = sink(
            DisplayServer::X11,
            FakeClipboard::new(true),
            Arc::default(),
            Vec::new(),
            Vec::new(),
        );
        let report = sink.export(&bitmap(), &ExportRequest::default());
        assert!(report.file.is_none());
        assert!(report.clipboard.is_none());
        assert!(!report.all_failed());
    }

    #[test]
    fn summary_serializes_only_present_fields() {
        let report = ExportReport {
            file: Some(Ok(PathBuf::from("/tmp/shot.png"))),
            clipboard: None,
        };
        let json = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(json, serde_json::json!({ "file": "/tmp/shot.png" }));
    }
}
