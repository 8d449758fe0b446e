//! Annotation primitives drawn on top of a selection
//!
//! All primitives store coordinates in frame pixel coordinates. They are plain
//! data: once built they are never mutated, only committed or undone.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};
use crate::config::ShapeColor;

/// Outline rectangle annotation (no fill)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangleAnnotation {
    pub rect: Rect,
    pub color: ShapeColor,
}

/// Outline ellipse annotation inscribed in `rect`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipseAnnotation {
    pub rect: Rect,
    pub color: ShapeColor,
}

/// Straight arrow pointing at `end`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrowAnnotation {
    pub start: Point,
    pub end: Point,
    pub color: ShapeColor,
}

/// Freehand brush stroke, at least one point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreehandAnnotation {
    pub points: Vec<Point>,
    pub color: ShapeColor,
}

/// Text drawn with its baseline starting at `anchor`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub anchor: Point,
    pub text: String,
    pub color: ShapeColor,
}

/// Mosaic (block-averaged) area for obscuring content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MosaicAnnotation {
    pub rect: Rect,
    pub block_size: u32,
}

/// Unified annotation type, painted in insertion order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnnotationPrimitive {
    Rectangle(RectangleAnnotation),
    Ellipse(EllipseAnnotation),
    Arrow(ArrowAnnotation),
    Freehand(FreehandAnnotation),
    Text(TextAnnotation),
    Mosaic(MosaicAnnotation),
}

impl AnnotationPrimitive {
    /// Colour the primitive is drawn with, `None` for mosaics
    pub fn color(&self) -> Option<ShapeColor> {
        match self {
            AnnotationPrimitive::Rectangle(r) => Some(r.color),
            AnnotationPrimitive::Ellipse(e) => Some(e.color),
            AnnotationPrimitive::Arrow(a) => Some(a.color),
            AnnotationPrimitive::Freehand(f) => Some(f.color),
            AnnotationPrimitive::Text(t) => Some(t.color),
            AnnotationPrimitive::Mosaic(_) => None,
        }
    }

    /// Copy of the primitive shifted by `(dx, dy)`
    pub fn translated(&self, dx: i32, dy: i32) -> AnnotationPrimitive {
        match self {
            AnnotationPrimitive::Rectangle(r) => AnnotationPrimitive::Rectangle(RectangleAnnotation {
                rect: r.rect.translate(dx, dy),
                color: r.color,
            }),
            AnnotationPrimitive::Ellipse(e) => AnnotationPrimitive::Ellipse(EllipseAnnotation {
                rect: e.rect.translate(dx, dy),
                color: e.color,
            }),
            AnnotationPrimitive::Arrow(a) => AnnotationPrimitive::Arrow(ArrowAnnotation {
                start: a.start.translate(dx, dy),
                end: a.end.translate(dx, dy),
                color: a.color,
            }),
            AnnotationPrimitive::Freehand(f) => AnnotationPrimitive::Freehand(FreehandAnnotation {
                points: f.points.iter().map(|p| p.translate(dx, dy)).collect(),
                color: f.color,
            }),
            AnnotationPrimitive::Text(t) => AnnotationPrimitive::Text(TextAnnotation {
                anchor: t.anchor.translate(dx, dy),
                text: t.text.clone(),
                color: t.color,
            }),
            AnnotationPrimitive::Mosaic(m) => AnnotationPrimitive::Mosaic(MosaicAnnotation {
                rect: m.rect.translate(dx, dy),
                block_size: m.block_size,
            }),
        }
    }

    /// Geometric extent of the primitive, before stroke width or glyph size
    pub fn extent(&self) -> Option<Rect> {
        match self {
            AnnotationPrimitive::Rectangle(r) => Some(r.rect),
            AnnotationPrimitive::Ellipse(e) => Some(e.rect),
            AnnotationPrimitive::Arrow(a) => Some(Rect::from_points(a.start, a.end)),
            AnnotationPrimitive::Freehand(f) => Rect::bounding(&f.points),
            AnnotationPrimitive::Text(t) => Some(Rect::from_points(t.anchor, t.anchor)),
            AnnotationPrimitive::Mosaic(m) => Some(m.rect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translated_moves_every_point() {
        let stroke = AnnotationPrimitive::Freehand(FreehandAnnotation {
            points: vec![Point::new(10, 10), Point::new(20, 30)],
            color: ShapeColor::default(),
        });
        let moved = stroke.translated(-10, -5);
        let AnnotationPrimitive::Freehand(f) = moved else {
            panic!("variant changed");
        };
        assert_eq!(f.points, vec![Point::new(0, 5), Point::new(10, 25)]);
    }

    #[test]
    fn extent_of_arrow_is_normalized() {
        let arrow = AnnotationPrimitive::Arrow(ArrowAnnotation {
            start: Point::new(40, 10),
            end: Point::new(5, 30),
            color: ShapeColor::default(),
        });
        assert_eq!(arrow.extent(), Some(Rect::new(5, 10, 40, 30)));
    }
}
