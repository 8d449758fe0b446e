//! Native display capture and multi-output compositing

use std::cell::RefCell;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{ConnectionExt as _, ImageFormat, ImageOrder};
use x11rb::rust_connection::RustConnection;

use crate::domain::Rect;
use crate::error::CaptureError;

use super::frame::FrameBuffer;

/// One physical output in the desktop's logical coordinate space
#[derive(Debug, Clone, PartialEq)]
pub struct OutputInfo {
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Logical size
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio
    pub scale: f32,
}

impl OutputInfo {
    /// Position and size in physical pixels relative to `origin`
    fn physical_rect(&self, origin_x: i32, origin_y: i32) -> Rect {
        let s = self.scale;
        Rect::from_xywh(
            ((self.x - origin_x) as f32 * s).round() as i32,
            ((self.y - origin_y) as f32 * s).round() as i32,
            (self.width as f32 * s).round() as u32,
            (self.height as f32 * s).round() as u32,
        )
    }
}

/// Platform display API able to enumerate and grab outputs
pub trait DisplayBackend {
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
    fn outputs(&self) -> Result<Vec<OutputInfo>, CaptureError>;
    fn grab(&self, output: &OutputInfo) -> Result<RgbaImage, CaptureError>;
}

/// Grab every output and merge them into one frame spanning their union
///
/// Succeeds if at least one output could be grabbed; uncovered areas and
/// failed outputs are left as [`FrameBuffer::SENTINEL`].
pub fn capture_outputs(backend: &dyn DisplayBackend) -> Result<FrameBuffer, CaptureError> {
    let outputs = backend.outputs()?;
    if outputs.is_empty() {
        return Err(CaptureError::Native("no outputs reported".to_string()));
    }

    let origin_x = outputs.iter().map(|o| o.x).min().unwrap_or(0);
    let origin_y = outputs.iter().map(|o| o.y).min().unwrap_or(0);
    let placements: Vec<Rect> = outputs
        .iter()
        .map(|o| o.physical_rect(origin_x, origin_y))
        .collect();
    let width = placements.iter().map(|r| r.right).max().unwrap_or(0).max(0) as u32;
    let height = placements.iter().map(|r| r.bottom).max().unwrap_or(0).max(0) as u32;
    log::debug!(
        "Compositing {} outputs into {}x{}",
        outputs.len(),
        width,
        height
    );

    let mut canvas = RgbaImage::from_pixel(width, height, FrameBuffer::SENTINEL);
    let mut scale = 0.0f32;
    let mut grabbed = 0;

    for (output, placement) in outputs.iter().zip(&placements) {
        if placement.is_empty() {
            log::warn!("Output {} has no area, skipping", output.name);
            continue;
        }
        let mut shot = match backend.grab(output) {
            Ok(shot) => shot,
            Err(err) => {
                log::warn!("Failed to grab output {}: {}", output.name, err);
                continue;
            }
        };

        let (w, h) = (placement.width() as u32, placement.height() as u32);
        if shot.dimensions() != (w, h) {
            log::debug!(
                "Output {} grabbed at {:?}, resizing to {}x{}",
                output.name,
                shot.dimensions(),
                w,
                h
            );
            shot = imageops::resize(&shot, w, h, FilterType::Lanczos3);
        }
        imageops::replace(&mut canvas, &shot, placement.left as i64, placement.top as i64);
        scale = scale.max(output.scale);
        grabbed += 1;
    }

    if grabbed == 0 {
        return Err(CaptureError::Native(format!(
            "none of {} outputs could be grabbed",
            outputs.len()
        )));
    }
    Ok(FrameBuffer::new(canvas, scale))
}

/// X11 backend: RandR monitors, pixels read from the root window
#[derive(Default)]
pub struct X11Backend {
    display: Option<String>,
    conn: RefCell<Option<(RustConnection, usize)>>,
}

impl X11Backend {
    pub fn new(display: Option<String>) -> Self {
        Self {
            display,
            conn: RefCell::new(None),
        }
    }

    fn with_connection<R>(
        &self,
        f: impl FnOnce(&RustConnection, usize) -> Result<R, CaptureError>,
    ) -> Result<R, CaptureError> {
        let mut slot = self.conn.borrow_mut();
        if slot.is_none() {
            let connected = x11rb::connect(self.display.as_deref()).map_err(native)?;
            *slot = Some(connected);
        }
        match slot.as_ref() {
            Some((conn, screen)) => f(conn, *screen),
            None => Err(CaptureError::Native("no X11 connection".to_string())),
        }
    }
}

fn native(err: impl std::fmt::Display) -> CaptureError {
    CaptureError::Native(err.to_string())
}

impl DisplayBackend for X11Backend {
    fn name(&self) -> &str {
        "x11"
    }

    fn is_available(&self) -> bool {
        self.display.is_some() || std::env::var_os("DISPLAY").is_some_and(|d| !d.is_empty())
    }

    fn outputs(&self) -> Result<Vec<OutputInfo>, CaptureError> {
        self.with_connection(|conn, screen_num| {
            let screen = conn
                .setup()
                .roots
                .get(screen_num)
                .ok_or_else(|| native("screen missing from setup"))?;

            let monitors = conn
                .randr_get_monitors(screen.root, true)
                .map_err(native)?
                .reply()
                .map(|reply| reply.monitors);
            let monitors = match monitors {
                Ok(monitors) if !monitors.is_empty() => monitors,
                Ok(_) => Vec::new(),
                Err(err) => {
                    log::debug!("RandR monitors unavailable: {}", err);
                    Vec::new()
                }
            };

            if monitors.is_empty() {
                return Ok(vec![OutputInfo {
                    name: "root".to_string(),
                    x: 0,
                    y: 0,
                    width: u32::from(screen.width_in_pixels),
                    height: u32::from(screen.height_in_pixels),
                    scale: 1.0,
                }]);
            }

            let mut outputs = Vec::with_capacity(monitors.len());
            for (index, monitor) in monitors.iter().enumerate() {
                let name = conn
                    .get_atom_name(monitor.name)
                    .ok()
                    .and_then(|cookie| cookie.reply().ok())
                    .map(|reply| String::from_utf8_lossy(&reply.name).into_owned())
                    .unwrap_or_else(|| format!("monitor-{index}"));
                outputs.push(OutputInfo {
                    name,
                    x: i32::from(monitor.x),
                    y: i32::from(monitor.y),
                    width: u32::from(monitor.width),
                    height: u32::from(monitor.height),
                    scale: 1.0,
                });
            }
            Ok(outputs)
        })
    }

    fn grab(&self, output: &OutputInfo) -> Result<RgbaImage, CaptureError> {
        self.with_connection(|conn, screen_num| {
            let setup = conn.setup();
            let root = setup
                .roots
                .get(screen_num)
                .ok_or_else(|| native("screen missing from setup"))?
                .root;

            let x = i16::try_from(output.x).map_err(native)?;
            let y = i16::try_from(output.y).map_err(native)?;
            let width = u16::try_from(output.width).map_err(native)?;
            let height = u16::try_from(output.height).map_err(native)?;

            let reply = conn
                .get_image(ImageFormat::Z_PIXMAP, root, x, y, width, height, !0)
                .map_err(native)?
                .reply()
                .map_err(native)?;

            let bits_per_pixel = setup
                .pixmap_formats
                .iter()
                .find(|format| format.depth == reply.depth)
                .map(|format| format.bits_per_pixel);
            if bits_per_pixel != Some(32) {
                return Err(native(format!(
                    "unsupported pixmap format: depth {} at {:?} bpp",
                    reply.depth, bits_per_pixel
                )));
            }

            let rgba = xpixels_to_rgba(&reply.data, setup.image_byte_order);
            RgbaImage::from_raw(output.width, output.height, rgba)
                .ok_or_else(|| native("image data shorter than requested area"))
        })
    }
}

/// 32-bit ZPixmap pixels to opaque RGBA
fn xpixels_to_rgba(data: &[u8], order: ImageOrder) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(data.len());
    for px in data.chunks_exact(4) {
        let (r, g, b) = if order == ImageOrder::MSB_FIRST {
            (px[1], px[2], px[3])
        } else {
            (px[2], px[1], px[0])
        };
        rgba.extend_from_slice(&[r, g, b, 255]);
    }
    rgba
}
