//! Native clipboard access

use std::borrow::Cow;
use std::cell::RefCell;

use anyhow::Context;
use image::RgbaImage;

/// Places images on the system clipboard
pub trait Clipboard {
    fn set_image(&self, image: &RgbaImage) -> anyhow::Result<()>;
}

/// [`Clipboard`] backed by `arboard`
///
/// The handle is kept open for the lifetime of this value; on X11 the
/// clipboard contents are served by it and vanish when it is dropped.
#[derive(Default)]
pub struct NativeClipboard {
    handle: RefCell<Option<arboard::Clipboard>>,
}

impl Clipboard for NativeClipboard {
    fn set_image(&self, image: &RgbaImage) -> anyhow::Result<()> {
        let mut handle = self.handle.borrow_mut();
        if handle.is_none() {
            *handle = Some(arboard::Clipboard::new().context("failed to open clipboard")?);
        }
        let Some(clipboard) = handle.as_mut() else {
            anyhow::bail!("clipboard handle missing");
        };

        clipboard
            .set_image(arboard::ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: Cow::Borrowed(image.as_raw()),
            })
            .context("failed to set clipboard image")?;
        log::info!(
            "Copied {}x{} image to clipboard",
            image.width(),
            image.height()
        );
        Ok(())
    }
}
