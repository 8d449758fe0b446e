//! Shared geometry for annotation rendering
//!
//! Constants and math used by the tiny-skia rasterizer and by hosts that draw
//! a live preview of the same primitives.

/// Arrow geometry constants
pub mod arrow {
    /// Shaft thickness in pixels
    pub const THICKNESS: f32 = 2.0;
    /// Distance from the tip to each base corner of the head
    pub const HEAD_SIZE: f32 = 10.0;
    /// Head corner angle from the shaft direction in radians (135 degrees)
    pub const HEAD_ANGLE: f32 = 2.356_194_5; // 135.0_f32.to_radians()

    /// Base corners of the arrow head at `end`, `None` for a zero-length arrow
    pub fn head_points(
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
        head_size: f32,
    ) -> Option<((f32, f32), (f32, f32))> {
        let dx = end_x - start_x;
        let dy = end_y - start_y;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }

        let angle = dy.atan2(dx);
        let left = angle + HEAD_ANGLE;
        let right = angle - HEAD_ANGLE;
        Some((
            (end_x + head_size * left.cos(), end_y + head_size * left.sin()),
            (end_x + head_size * right.cos(), end_y + head_size * right.sin()),
        ))
    }
}

/// Rectangle and ellipse outlines
pub mod shape {
    /// Stroke thickness in pixels
    pub const THICKNESS: f32 = 2.0;

    /// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
    pub const BEZIER_K: f32 = 0.552_284_8;
}

/// Freehand strokes
pub mod brush {
    pub const THICKNESS: f32 = 3.0;
}

/// Bitmap text labels
pub mod text {
    /// Glyph cell edge in font units
    pub const GLYPH: i32 = 8;
    /// Font units to pixels
    pub const SCALE: i32 = 2;
    /// Horizontal offset of the second strike
    pub const EMBOLDEN: i32 = 1;
    /// Pixel height of a line; the anchor sits on its bottom edge
    pub const LINE_HEIGHT: i32 = GLYPH * SCALE;
    pub const ADVANCE: i32 = GLYPH * SCALE;
}

/// Calculate ellipse center and radii from bounding box
#[inline]
pub fn ellipse_from_bounds(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (f32, f32, f32, f32) {
    let cx = (min_x + max_x) * 0.5;
    let cy = (min_y + max_y) * 0.5;
    let rx = ((max_x - min_x) * 0.5).max(1.0);
    let ry = ((max_y - min_y) * 0.5).max(1.0);
    (cx, cy, rx, ry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn head_corners_trail_the_tip() {
        // Horizontal arrow pointing right
        let ((lx, ly), (rx, ry)) = arrow::head_points(0.0, 0.0, 100.0, 0.0, 10.0).unwrap();
        let offset = 10.0 * std::f32::consts::FRAC_1_SQRT_2;
        assert!(close(lx, 100.0 - offset) && close(ly, offset));
        assert!(close(rx, 100.0 - offset) && close(ry, -offset));
    }

    #[test]
    fn zero_length_arrow_has_no_head() {
        assert!(arrow::head_points(5.0, 5.0, 5.0, 5.0, 10.0).is_none());
    }

    #[test]
    fn ellipse_radii_never_collapse() {
        assert_eq!(ellipse_from_bounds(10.0, 10.0, 10.0, 30.0), (10.0, 20.0, 1.0, 10.0));
    }
}
