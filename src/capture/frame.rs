//! Captured desktop image

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::domain::{Point, Rect};
use crate::error::CaptureError;

/// A captured desktop: RGBA pixels plus the device pixel ratio they were
/// captured at
///
/// Immutable once created. Areas of a multi-output desktop that no output
/// covers hold [`FrameBuffer::SENTINEL`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    image: RgbaImage,
    scale: f32,
}

impl FrameBuffer {
    /// Fill for pixels no output covers
    pub const SENTINEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

    pub fn new(image: RgbaImage, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        log::debug!(
            "FrameBuffer created: {}x{} pixels, scale {}",
            image.width(),
            image.height(),
            scale
        );
        Self { image, scale }
    }

    /// Build from raw RGBA bytes; `None` unless `pixels.len() == width * height * 4`
    pub fn from_raw(width: u32, height: u32, scale: f32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(|image| Self::new(image, scale))
    }

    /// A frame of the given size filled with the sentinel
    pub fn blank(width: u32, height: u32, scale: f32) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Self::SENTINEL), scale)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(0, 0, self.width(), self.height())
    }

    /// Map a host coordinate in logical units to frame pixels
    pub fn to_physical(&self, point: Point) -> Point {
        Point::new(
            (point.x as f32 * self.scale).round() as i32,
            (point.y as f32 * self.scale).round() as i32,
        )
    }
}

/// Decode an image file written by an external producer
pub(crate) fn decode_file(path: &Path, origin: &str) -> Result<FrameBuffer, CaptureError> {
    let decode_failure = |reason: String| CaptureError::DecodeFailure {
        origin: origin.to_string(),
        reason,
    };

    let len = std::fs::metadata(path)
        .map_err(|e| decode_failure(format!("{}: {}", path.display(), e)))?
        .len();
    if len == 0 {
        return Err(decode_failure(format!("{} is empty", path.display())));
    }

    let image = image::open(path)
        .map_err(|e| decode_failure(e.to_string()))?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(decode_failure("image has no pixels".to_string()));
    }
    Ok(FrameBuffer::new(image, 1.0))
}
