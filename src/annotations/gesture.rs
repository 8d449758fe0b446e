//! In-progress drawing gestures
//!
//! A gesture starts on pointer press, follows pointer motion and turns into an
//! [`AnnotationPrimitive`] on release.

use crate::config::ShapeColor;
use crate::domain::{
    AnnotationPrimitive, ArrowAnnotation, EllipseAnnotation, FreehandAnnotation, MosaicAnnotation,
    Point, Rect, RectangleAnnotation, Tool,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    tool: Tool,
    start: Point,
    end: Point,
    /// Freehand path, starting with `start`
    points: Vec<Point>,
}

impl Gesture {
    /// `None` for tools that are not drawn by dragging
    pub fn begin(tool: Tool, at: Point) -> Option<Self> {
        if !tool.is_gesture() {
            return None;
        }
        Some(Self {
            tool,
            start: at,
            end: at,
            points: vec![at],
        })
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn update(&mut self, to: Point) {
        self.end = to;
        if self.tool == Tool::Freehand && self.points.last() != Some(&to) {
            self.points.push(to);
        }
    }

    /// The primitive this gesture would commit right now
    pub fn primitive(&self, color: ShapeColor, mosaic_block: u32) -> Option<AnnotationPrimitive> {
        let rect = Rect::from_points(self.start, self.end);
        let primitive = match self.tool {
            Tool::Rectangle => AnnotationPrimitive::Rectangle(RectangleAnnotation { rect, color }),
            Tool::Ellipse => AnnotationPrimitive::Ellipse(EllipseAnnotation { rect, color }),
            Tool::Arrow => AnnotationPrimitive::Arrow(ArrowAnnotation {
                start: self.start,
                end: self.end,
                color,
            }),
            Tool::Freehand => AnnotationPrimitive::Freehand(FreehandAnnotation {
                points: self.points.clone(),
                color,
            }),
            Tool::Mosaic => AnnotationPrimitive::Mosaic(MosaicAnnotation {
                rect,
                block_size: mosaic_block,
            }),
            Tool::None | Tool::Text => return None,
        };
        Some(primitive)
    }
}
