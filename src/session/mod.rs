//! Interactive screenshot session
//!
//! This module contains:
//! - Input events and outcomes (events.rs)
//! - Keyboard shortcut mapping (shortcuts.rs)
//! - The selection and annotation state machine (controller.rs)
//! - [`ScreenshotSession`], which flattens and exports on finish

pub mod controller;
pub mod events;
pub mod shortcuts;

use std::sync::Arc;

use image::RgbaImage;

use crate::capture::FrameBuffer;
use crate::config::Config;
use crate::domain::ExportTarget;
use crate::error::ExportError;
use crate::export::{ExportReport, ExportSink};
use crate::platform::{FileChooser, TextInputPrompt};
use crate::render::Compositor;

pub use controller::SelectionController;
pub use events::{InputEvent, Key, Modifiers, Outcome, PointerButton, ToolbarAction};
pub use shortcuts::Shortcut;

/// What the host should do after [`ScreenshotSession::handle`]
#[derive(Debug)]
pub enum SessionStep {
    /// Keep the session open and act on the controller outcome
    Continue(Outcome),
    /// The selection was exported; close the session
    Exported(ExportReport),
    /// Exporting failed; the session stays open so the user can retry
    ExportFailed(ExportError),
    /// The user aborted
    Cancelled,
}

/// One capture being selected, annotated and exported
pub struct ScreenshotSession {
    frame: Arc<FrameBuffer>,
    controller: SelectionController,
    compositor: Compositor,
    sink: ExportSink,
    chooser: Box<dyn FileChooser>,
}

impl ScreenshotSession {
    pub fn new(
        config: &Config,
        frame: Arc<FrameBuffer>,
        prompt: Box<dyn TextInputPrompt>,
        sink: ExportSink,
        chooser: Box<dyn FileChooser>,
    ) -> Self {
        let controller = SelectionController::new(config, frame.bounds(), prompt);
        Self {
            frame,
            controller,
            compositor: Compositor::new(),
            sink,
            chooser,
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    /// The locked selection with its annotations, if a selection exists
    pub fn flatten(&self) -> Option<RgbaImage> {
        let selection = self.controller.selection()?;
        Some(
            self.compositor
                .render(&self.frame, selection, self.controller.model().list()),
        )
    }

    pub fn handle(&mut self, event: InputEvent) -> SessionStep {
        match self.controller.handle(event) {
            Outcome::Finish(target) => self.finish(target),
            Outcome::Cancel => {
                log::info!("Screenshot session cancelled");
                SessionStep::Cancelled
            }
            outcome => SessionStep::Continue(outcome),
        }
    }

    fn finish(&mut self, target: ExportTarget) -> SessionStep {
        let Some(bitmap) = self.flatten() else {
            return SessionStep::Continue(Outcome::Ignored);
        };

        let report = match target {
            ExportTarget::Clipboard => ExportReport {
                file: None,
                clipboard: Some(self.sink.export_to_clipboard(&bitmap, None)),
            },
            ExportTarget::File => match self.sink.save_with_chooser(&bitmap, self.chooser.as_ref()) {
                Ok(Some(path)) => ExportReport {
                    file: Some(Ok(path)),
                    clipboard: None,
                },
                // Dialog dismissed: back to editing
                Ok(None) => return SessionStep::Continue(Outcome::Ignored),
                Err(err) => {
                    log::error!("Saving screenshot failed: {}", err);
                    return SessionStep::ExportFailed(err);
                }
            },
        };

        match report.clipboard {
            Some(Err(err)) => {
                log::error!("Copying screenshot failed: {}", err);
                SessionStep::ExportFailed(err)
            }
            _ => {
                self.controller.reset();
                SessionStep::Exported(report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Point, Rect, SelectionState, Tool};
    use crate::export::tests::{FakeClipboard, RecordingRunner};
    use crate::platform::{DisplayServer, ToolLocator};
    use ::image::Rgba;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    struct NoPrompt;

    impl TextInputPrompt for NoPrompt {
        fn ask(&self, _title: &str, _label: &str) -> Option<String> {
            None
        }
    }

    struct NothingInstalled;

    impl ToolLocator for NothingInstalled {
        fn exists(&self, _path: &Path) -> bool {
            false
        }
    }

    struct Chooser {
        answer: Option<PathBuf>,
        asked: Rc<RefCell<u32>>,
    }

    impl FileChooser for Chooser {
        fn choose_save_path(&self, _suggested: &Path) -> Option<PathBuf> {
            *self.asked.borrow_mut() += 1;
            self.answer.clone()
        }
    }

    fn session(clipboard_works: bool, save_to: Option<PathBuf>) -> (ScreenshotSession, Rc<RefCell<u32>>) {
        let frame = Arc::new(FrameBuffer::new(
            RgbaImage::from_pixel(300, 200, Rgba([255, 255, 255, 255])),
            1.0,
        ));
        let sink = ExportSink::new(
            &Config::default(),
            DisplayServer::X11,
            Arc::new(RecordingRunner::default()),
            Arc::new(NothingInstalled),
            Box::new(FakeClipboard::new(clipboard_works)),
        )
        .with_save_dirs(Vec::new());
        let asked = Rc::new(RefCell::new(0));
        let chooser = Chooser {
            answer: save_to,
            asked: asked.clone(),
        };
        let session = ScreenshotSession::new(
            &Config::default(),
            frame,
            Box::new(NoPrompt),
            sink,
            Box::new(chooser),
        );
        (session, asked)
    }

    fn select_and_draw(session: &mut ScreenshotSession) {
        let events = [
            InputEvent::PointerDown(Point::new(10, 10), PointerButton::Primary),
            InputEvent::PointerMove(Point::new(110, 110)),
            InputEvent::PointerUp(Point::new(110, 110), PointerButton::Primary),
            InputEvent::ToolSelected(Tool::Rectangle),
            InputEvent::PointerDown(Point::new(20, 20), PointerButton::Primary),
            InputEvent::PointerMove(Point::new(50, 50)),
            InputEvent::PointerUp(Point::new(50, 50), PointerButton::Primary),
        ];
        for event in events {
            assert!(matches!(session.handle(event), SessionStep::Continue(_)));
        }
    }

    fn enter() -> InputEvent {
        InputEvent::KeyPress(Key::Enter, Modifiers::NONE)
    }

    #[test]
    fn flatten_renders_selection_with_annotations() {
        let (mut session, _) = session(true, None);
        assert!(session.flatten().is_none());

        select_and_draw(&mut session);
        let bitmap = session.flatten().unwrap();
        assert_eq!(bitmap.dimensions(), (100, 100));
        let edge = bitmap.get_pixel(10, 25);
        assert!(edge[0] > 200 && edge[1] < 60);
        assert_eq!(session.controller().selection(), Some(Rect::new(10, 10, 110, 110)));
    }

    #[test]
    fn enter_copies_and_ends_session() {
        let (mut session, _) = session(true, None);
        select_and_draw(&mut session);

        let SessionStep::Exported(report) = session.handle(enter()) else {
            panic!("expected an export");
        };
        assert!(matches!(report.clipboard, Some(Ok(ref strategy)) if strategy == "native"));
        assert_eq!(session.controller().state(), SelectionState::Idle);
    }

    #[test]
    fn failed_copy_keeps_the_session() {
        let (mut session, _) = session(false, None);
        select_and_draw(&mut session);

        assert!(matches!(
            session.handle(enter()),
            SessionStep::ExportFailed(ExportError::ClipboardUnavailable { .. })
        ));
        assert_eq!(session.controller().state(), SelectionState::Selected);
        assert_eq!(session.controller().model().len(), 1);
    }

    #[test]
    fn save_writes_chosen_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("annotated.png");
        let (mut session, asked) = session(true, Some(target.clone()));
        select_and_draw(&mut session);

        let step = session.handle(InputEvent::KeyPress(Key::Character('s'), Modifiers::CTRL));
        let SessionStep::Exported(report) = step else {
            panic!("expected an export");
        };
        assert_eq!(report.saved_path(), Some(&target));
        assert_eq!(*asked.borrow(), 1);
        let saved = ::image::open(&target).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (100, 100));
    }

    #[test]
    fn dismissed_save_dialog_returns_to_editing() {
        let (mut session, asked) = session(true, None);
        select_and_draw(&mut session);

        let step = session.handle(InputEvent::Toolbar(ToolbarAction::Save));
        assert!(matches!(step, SessionStep::Continue(Outcome::Ignored)));
        assert_eq!(*asked.borrow(), 1);
        assert_eq!(session.controller().state(), SelectionState::Selected);
    }

    #[test]
    fn escape_cancels() {
        let (mut session, _) = session(true, None);
        select_and_draw(&mut session);
        let step = session.handle(InputEvent::KeyPress(Key::Escape, Modifiers::NONE));
        assert!(matches!(step, SessionStep::Cancelled));
        assert!(session.flatten().is_none());
    }
}
