//! Selection and annotation state machine
//!
//! The controller owns the selection rectangle, the active tool and the
//! annotation model. Hosts feed it [`InputEvent`]s and act on the returned
//! [`Outcome`]; it never touches pixels itself.

use crate::annotations::{AnnotationModel, Gesture};
use crate::config::{Config, ShapeColor};
use crate::domain::{
    AnnotationPrimitive, ExportTarget, Point, Rect, SelectionState, TextAnnotation, Tool,
};
use crate::platform::TextInputPrompt;
use crate::session::events::{InputEvent, Key, Modifiers, Outcome, PointerButton, ToolbarAction};
use crate::session::shortcuts::{Shortcut, handle_key_event};

const TEXT_PROMPT_TITLE: &str = "Add text";
const TEXT_PROMPT_LABEL: &str = "Text:";

pub struct SelectionController {
    frame_bounds: Rect,
    min_selection: i32,
    snap_size: i32,
    mosaic_block: u32,
    default_color: ShapeColor,

    state: SelectionState,
    start: Point,
    end: Point,
    selection: Option<Rect>,
    tool: Tool,
    color: ShapeColor,
    gesture: Option<Gesture>,
    model: AnnotationModel,
    prompt: Box<dyn TextInputPrompt>,
}

impl SelectionController {
    pub fn new(config: &Config, frame_bounds: Rect, prompt: Box<dyn TextInputPrompt>) -> Self {
        Self {
            frame_bounds,
            min_selection: config.min_selection_size,
            snap_size: config.snap_selection_size,
            mosaic_block: config.mosaic_block_size,
            default_color: config.annotation_color,
            state: SelectionState::Idle,
            start: Point::default(),
            end: Point::default(),
            selection: None,
            tool: Tool::None,
            color: config.annotation_color,
            gesture: None,
            model: AnnotationModel::new(),
            prompt,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The locked selection, once the first drag has finished
    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> ShapeColor {
        self.color
    }

    pub fn model(&self) -> &AnnotationModel {
        &self.model
    }

    /// Primitive for the gesture being drawn, not yet in the model
    pub fn preview_primitive(&self) -> Option<AnnotationPrimitive> {
        self.gesture
            .as_ref()
            .and_then(|gesture| gesture.primitive(self.color, self.mosaic_block))
    }

    /// Back to `Idle` with no selection and no annotations
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
        self.start = Point::default();
        self.end = Point::default();
        self.selection = None;
        self.tool = Tool::None;
        self.color = self.default_color;
        self.gesture = None;
        self.model.clear();
    }

    pub fn handle(&mut self, event: InputEvent) -> Outcome {
        match event {
            InputEvent::PointerDown(at, PointerButton::Primary) => self.pointer_down(at),
            InputEvent::PointerMove(at) => self.pointer_move(at),
            InputEvent::PointerUp(at, PointerButton::Primary) => self.pointer_up(at),
            InputEvent::PointerDown(..) | InputEvent::PointerUp(..) => Outcome::Ignored,
            InputEvent::KeyPress(key, modifiers) => self.key_press(key, modifiers),
            InputEvent::ToolSelected(tool) => self.select_tool(tool),
            InputEvent::ColorSelected(color) => {
                self.color = color;
                Outcome::Redraw
            }
            InputEvent::Toolbar(action) => self.toolbar(action),
        }
    }

    fn pointer_down(&mut self, at: Point) -> Outcome {
        match self.state {
            SelectionState::Idle => {
                self.state = SelectionState::Selecting;
                self.start = at;
                self.end = at;
                Outcome::Preview(Rect::from_points(at, at))
            }
            SelectionState::Selected => {
                let Some(selection) = self.selection else {
                    return Outcome::Ignored;
                };
                if !selection.contains_point(at) {
                    log::trace!("Press at {:?} outside selection {:?}", at, selection);
                    return Outcome::Ignored;
                }
                if self.tool == Tool::Text {
                    return self.add_text(at);
                }
                match Gesture::begin(self.tool, at) {
                    Some(gesture) => {
                        self.gesture = Some(gesture);
                        self.state = SelectionState::Drawing;
                        Outcome::Redraw
                    }
                    None => Outcome::Ignored,
                }
            }
            SelectionState::Selecting | SelectionState::Drawing => Outcome::Ignored,
        }
    }

    fn pointer_move(&mut self, at: Point) -> Outcome {
        match self.state {
            SelectionState::Selecting => {
                self.end = at;
                Outcome::Preview(Rect::from_points(self.start, self.end))
            }
            SelectionState::Drawing => match self.gesture.as_mut() {
                Some(gesture) => {
                    gesture.update(at);
                    Outcome::Redraw
                }
                None => Outcome::Ignored,
            },
            SelectionState::Idle | SelectionState::Selected => Outcome::Ignored,
        }
    }

    fn pointer_up(&mut self, at: Point) -> Outcome {
        match self.state {
            SelectionState::Selecting => {
                self.end = at;
                let selection = self.lock_selection();
                self.selection = Some(selection);
                self.state = SelectionState::Selected;
                log::debug!("Selection locked at {:?}", selection);
                Outcome::Preview(selection)
            }
            SelectionState::Drawing => {
                self.state = SelectionState::Selected;
                let Some(mut gesture) = self.gesture.take() else {
                    return Outcome::Ignored;
                };
                gesture.update(at);
                let started_inside = self
                    .selection
                    .is_some_and(|selection| selection.contains_point(gesture.start()));
                if started_inside {
                    if let Some(primitive) = gesture.primitive(self.color, self.mosaic_block) {
                        self.model.commit(primitive);
                    }
                } else {
                    log::debug!("Discarding {:?} gesture started outside the selection", gesture.tool());
                }
                Outcome::Redraw
            }
            SelectionState::Idle | SelectionState::Selected => Outcome::Ignored,
        }
    }

    /// Snap tiny drags to a default square, then clamp to the frame
    fn lock_selection(&self) -> Rect {
        let dragged = Rect::from_points(self.start, self.end);
        let rect = if dragged.width() < self.min_selection || dragged.height() < self.min_selection
        {
            let side = self.snap_size.max(1) as u32;
            Rect::from_xywh(self.start.x, self.start.y, side, side)
        } else {
            dragged
        };
        // A selection entirely off the frame falls back to the whole frame
        rect.intersect(self.frame_bounds).unwrap_or(self.frame_bounds)
    }

    fn add_text(&mut self, at: Point) -> Outcome {
        match self.prompt.ask(TEXT_PROMPT_TITLE, TEXT_PROMPT_LABEL) {
            Some(text) if !text.is_empty() => {
                self.model.commit(AnnotationPrimitive::Text(TextAnnotation {
                    anchor: at,
                    text,
                    color: self.color,
                }));
                Outcome::Redraw
            }
            _ => Outcome::Ignored,
        }
    }

    fn key_press(&mut self, key: Key, modifiers: Modifiers) -> Outcome {
        match handle_key_event(key, modifiers) {
            Some(Shortcut::Cancel) => self.cancel(),
            Some(Shortcut::Finish(target)) => self.finish(target),
            Some(Shortcut::Undo) => self.undo(),
            None => Outcome::Ignored,
        }
    }

    fn toolbar(&mut self, action: ToolbarAction) -> Outcome {
        match action {
            ToolbarAction::Undo => self.undo(),
            ToolbarAction::Save => self.finish(ExportTarget::File),
            ToolbarAction::Copy => self.finish(ExportTarget::Clipboard),
            ToolbarAction::Cancel => self.cancel(),
        }
    }

    fn select_tool(&mut self, tool: Tool) -> Outcome {
        if self.state != SelectionState::Selected {
            return Outcome::Ignored;
        }
        self.tool = tool;
        Outcome::Redraw
    }

    fn cancel(&mut self) -> Outcome {
        self.reset();
        Outcome::Cancel
    }

    fn finish(&mut self, target: ExportTarget) -> Outcome {
        if self.state == SelectionState::Selected {
            Outcome::Finish(target)
        } else {
            Outcome::Ignored
        }
    }

    fn undo(&mut self) -> Outcome {
        match self.state {
            SelectionState::Selected | SelectionState::Drawing if self.model.undo() => {
                Outcome::Redraw
            }
            _ => Outcome::Ignored,
        }
    }
}
