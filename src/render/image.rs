//! Annotation rasterization using tiny-skia
//!
//! Every function draws one primitive onto a pixmap whose origin is the
//! top-left corner of the output region.

use image::RgbaImage;
use tiny_skia::{
    FillRule, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use super::geometry::{self, arrow, brush, shape};
use super::text;
use crate::config::ShapeColor;
use crate::domain::{
    AnnotationPrimitive, ArrowAnnotation, EllipseAnnotation, FreehandAnnotation, MosaicAnnotation,
    Rect, RectangleAnnotation,
};

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
pub(crate) fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let Some(size) = IntSize::from_wh(img.width(), img.height()) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    // Copy back
    img.copy_from_slice(pixmap.data());
}

fn paint_for(color: ShapeColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn stroke_of(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// Draw one primitive
pub fn draw_primitive(pixmap: &mut Pixmap, primitive: &AnnotationPrimitive) {
    match primitive {
        AnnotationPrimitive::Rectangle(rect) => draw_rectangle(pixmap, rect),
        AnnotationPrimitive::Ellipse(ellipse) => draw_ellipse(pixmap, ellipse),
        AnnotationPrimitive::Arrow(arrow) => draw_arrow(pixmap, arrow),
        AnnotationPrimitive::Freehand(stroke) => draw_freehand(pixmap, stroke),
        AnnotationPrimitive::Text(label) => text::draw_text(pixmap, label),
        AnnotationPrimitive::Mosaic(mosaic) => draw_mosaic(pixmap, mosaic),
    }
}

/// Build an ellipse path using cubic bezier curves
fn build_ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<tiny_skia::Path> {
    let kx = rx * shape::BEZIER_K;
    let ky = ry * shape::BEZIER_K;

    let mut pb = PathBuilder::new();

    // Start at top
    pb.move_to(cx, cy - ry);

    // Top to right
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);

    // Right to bottom
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);

    // Bottom to left
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);

    // Left to top
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);

    pb.close();
    pb.finish()
}

pub fn draw_rectangle(pixmap: &mut Pixmap, rect: &RectangleAnnotation) {
    let r = rect.rect;
    let (min_x, min_y, max_x, max_y) = (r.left as f32, r.top as f32, r.right as f32, r.bottom as f32);

    let mut pb = PathBuilder::new();
    pb.move_to(min_x, min_y);
    pb.line_to(max_x, min_y);
    pb.line_to(max_x, max_y);
    pb.line_to(min_x, max_y);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };

    pixmap.stroke_path(
        &path,
        &paint_for(rect.color),
        &stroke_of(shape::THICKNESS),
        Transform::identity(),
        None,
    );
}

pub fn draw_ellipse(pixmap: &mut Pixmap, ellipse: &EllipseAnnotation) {
    let r = ellipse.rect;
    let (cx, cy, rx, ry) =
        geometry::ellipse_from_bounds(r.left as f32, r.top as f32, r.right as f32, r.bottom as f32);
    let Some(path) = build_ellipse_path(cx, cy, rx, ry) else {
        return;
    };

    pixmap.stroke_path(
        &path,
        &paint_for(ellipse.color),
        &stroke_of(shape::THICKNESS),
        Transform::identity(),
        None,
    );
}

/// Straight shaft plus a filled triangular head at `end`
pub fn draw_arrow(pixmap: &mut Pixmap, arrow_ann: &ArrowAnnotation) {
    let (start_x, start_y) = (arrow_ann.start.x as f32, arrow_ann.start.y as f32);
    let (end_x, end_y) = (arrow_ann.end.x as f32, arrow_ann.end.y as f32);
    let paint = paint_for(arrow_ann.color);

    let mut pb = PathBuilder::new();
    pb.move_to(start_x, start_y);
    pb.line_to(end_x, end_y);
    if let Some(shaft) = pb.finish() {
        pixmap.stroke_path(
            &shaft,
            &paint,
            &stroke_of(arrow::THICKNESS),
            Transform::identity(),
            None,
        );
    }

    let Some(((lx, ly), (rx, ry))) =
        arrow::head_points(start_x, start_y, end_x, end_y, arrow::HEAD_SIZE)
    else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.move_to(end_x, end_y);
    pb.line_to(lx, ly);
    pb.line_to(rx, ry);
    pb.close();
    if let Some(head) = pb.finish() {
        pixmap.fill_path(&head, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Round-capped polyline; a single point becomes a dot of the stroke width
pub fn draw_freehand(pixmap: &mut Pixmap, stroke: &FreehandAnnotation) {
    let paint = paint_for(stroke.color);
    let (first, rest) = match stroke.points.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        if let Some(dot) =
            PathBuilder::from_circle(first.x as f32, first.y as f32, brush::THICKNESS / 2.0)
        {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for point in rest {
        pb.line_to(point.x as f32, point.y as f32);
    }
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(
            &path,
            &paint,
            &stroke_of(brush::THICKNESS),
            Transform::identity(),
            None,
        );
    }
}

/// Replace each block inside the rectangle by its average colour
pub fn draw_mosaic(pixmap: &mut Pixmap, mosaic: &MosaicAnnotation) {
    let (width, height) = (pixmap.width(), pixmap.height());
    let bounds = Rect::from_xywh(0, 0, width, height);
    let Some(area) = mosaic.rect.intersect(bounds) else {
        return;
    };
    let block = mosaic.block_size.max(1) as i32;
    let stride = width as usize * 4;
    let data = pixmap.data_mut();

    let mut block_y = area.top;
    while block_y < area.bottom {
        let block_end_y = (block_y + block).min(area.bottom);

        let mut block_x = area.left;
        while block_x < area.right {
            let block_end_x = (block_x + block).min(area.right);

            // Calculate average color for this block
            let mut totals = [0u64; 4];
            let mut pixel_count: u64 = 0;
            for py in block_y..block_end_y {
                for px in block_x..block_end_x {
                    let i = py as usize * stride + px as usize * 4;
                    for (total, channel) in totals.iter_mut().zip(&data[i..i + 4]) {
                        *total += u64::from(*channel);
                    }
                    pixel_count += 1;
                }
            }

            if pixel_count > 0 {
                let avg = totals.map(|total| (total / pixel_count) as u8);
                for py in block_y..block_end_y {
                    for px in block_x..block_end_x {
                        let i = py as usize * stride + px as usize * 4;
                        data[i..i + 4].copy_from_slice(&avg);
                    }
                }
            }

            block_x += block;
        }
        block_y += block;
    }
}
