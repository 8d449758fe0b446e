//! Bitmap text labels
//!
//! Glyphs come from font8x8, scaled up and struck twice one pixel apart for a
//! bold look. The label's anchor is the left end of its baseline.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use tiny_skia::{Pixmap, Transform};

use super::geometry::text::{ADVANCE, EMBOLDEN, GLYPH, LINE_HEIGHT, SCALE};
use crate::domain::{Rect, TextAnnotation};

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Pixel bounds the label can touch
pub fn text_bounds(label: &TextAnnotation) -> Rect {
    let chars = label.text.chars().count() as i32;
    Rect::new(
        label.anchor.x,
        label.anchor.y - LINE_HEIGHT,
        label.anchor.x + chars * ADVANCE + EMBOLDEN,
        label.anchor.y,
    )
}

pub fn draw_text(pixmap: &mut Pixmap, label: &TextAnnotation) {
    let [r, g, b, a] = label.color.to_rgba_u8();
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(r, g, b, a);

    let top = label.anchor.y - LINE_HEIGHT;
    let mut cursor_x = label.anchor.x;
    for ch in label.text.chars() {
        let Some(rows) = glyph(ch) else {
            cursor_x += ADVANCE;
            continue;
        };
        for (row_idx, row_bits) in rows.iter().enumerate() {
            for col_idx in 0..GLYPH {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                let x = cursor_x + col_idx * SCALE;
                let y = top + row_idx as i32 * SCALE;
                for strike in [0, EMBOLDEN] {
                    if let Some(cell) = tiny_skia::Rect::from_xywh(
                        (x + strike) as f32,
                        y as f32,
                        SCALE as f32,
                        SCALE as f32,
                    ) {
                        pixmap.fill_rect(cell, &paint, Transform::identity(), None);
                    }
                }
            }
        }
        cursor_x += ADVANCE;
    }
}
