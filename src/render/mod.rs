//! Annotation rendering module
//!
//! This module contains:
//! - Geometry constants shared with live previews (geometry.rs)
//! - Per-primitive rasterization using tiny-skia (image.rs)
//! - Bitmap font labels (text.rs)
//! - The compositor that flattens a frame region and its annotations

pub mod geometry;
pub mod image;
pub mod text;

use ::image::RgbaImage;
use ::image::imageops;

use crate::capture::FrameBuffer;
use crate::domain::{AnnotationPrimitive, Rect};
use crate::error::CompositorError;

/// Extra pixels a primitive may paint beyond its geometric extent
const PAINT_MARGIN: i32 = geometry::arrow::HEAD_SIZE as i32 + 2;

/// Flattens a region of a frame and its annotations into one bitmap
///
/// Output is a pure function of the inputs: the same frame, region and
/// annotation list always produce identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    pub fn new() -> Self {
        Self
    }

    /// Render `region` of `frame` with `annotations` painted in list order
    ///
    /// The region is clipped to the frame; if nothing is left the result is a
    /// 0x0 bitmap. Annotations are in frame coordinates.
    pub fn render(
        &self,
        frame: &FrameBuffer,
        region: Rect,
        annotations: &[AnnotationPrimitive],
    ) -> RgbaImage {
        match region.intersect(frame.bounds()) {
            Some(clip) => self.render_clipped(frame, clip, annotations),
            None => {
                log::debug!("Region {:?} is outside the frame, nothing to render", region);
                RgbaImage::new(0, 0)
            }
        }
    }

    /// Like [`render`](Self::render), but an empty clipped region is an error
    pub fn try_render(
        &self,
        frame: &FrameBuffer,
        region: Rect,
        annotations: &[AnnotationPrimitive],
    ) -> Result<RgbaImage, CompositorError> {
        let clip = region
            .intersect(frame.bounds())
            .ok_or(CompositorError::InvalidRegion { region })?;
        Ok(self.render_clipped(frame, clip, annotations))
    }

    fn render_clipped(
        &self,
        frame: &FrameBuffer,
        clip: Rect,
        annotations: &[AnnotationPrimitive],
    ) -> RgbaImage {
        let (width, height) = (clip.width() as u32, clip.height() as u32);
        let mut out =
            imageops::crop_imm(frame.image(), clip.left as u32, clip.top as u32, width, height)
                .to_image();
        if annotations.is_empty() {
            return out;
        }

        let visible = Rect::from_xywh(0, 0, width, height);
        image::with_pixmap(&mut out, |pixmap| {
            for primitive in annotations {
                let local = primitive.translated(-clip.left, -clip.top);
                let on_screen = paint_bounds(&local)
                    .and_then(|bounds| bounds.intersect(visible))
                    .is_some();
                if !on_screen {
                    log::trace!("Skipping annotation outside the region: {:?}", local);
                    continue;
                }
                image::draw_primitive(pixmap, &local);
            }
        });
        out
    }
}

/// Pixels a primitive can touch, including stroke width and arrow heads
fn paint_bounds(primitive: &AnnotationPrimitive) -> Option<Rect> {
    match primitive {
        AnnotationPrimitive::Text(label) => Some(text::text_bounds(label)),
        AnnotationPrimitive::Mosaic(mosaic) => Some(mosaic.rect),
        other => other.extent().map(|extent| extent.inflate(PAINT_MARGIN)),
    }
}
