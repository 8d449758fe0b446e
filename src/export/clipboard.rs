//! Copying screenshots to the clipboard

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use image::RgbaImage;
use tempfile::NamedTempFile;

use super::ExportSink;
use super::file::{SaveFormat, write_png};
use crate::error::ExportError;
use crate::platform::ProcessCommand;
use crate::strategy::{Strategy, StrategyChain};

const NATIVE: &str = "native";
const WL_COPY: &str = "wl-copy";

/// Scoped PNG copy of the bitmap, removed on drop
fn temp_png(bitmap: &RgbaImage) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("snapmark-")
        .suffix(".png")
        .tempfile()
        .context("failed to create temporary PNG")?;
    write_png(file.as_file_mut(), bitmap)?;
    file.flush()?;
    Ok(file)
}

impl ExportSink {
    /// Copy `bitmap` to the clipboard, returning the strategy that worked
    ///
    /// On Wayland a failed native copy falls back to `wl-copy`, fed
    /// `written_file` when it is a PNG or a temporary PNG otherwise.
    pub fn export_to_clipboard(
        &self,
        bitmap: &RgbaImage,
        written_file: Option<&Path>,
    ) -> Result<String, ExportError> {
        let mut chain: StrategyChain<'_, (), anyhow::Error> = StrategyChain::new("clipboard");

        chain.push(Strategy::new(
            NATIVE,
            self.clipboard_timeout,
            || true,
            |_timeout| self.clipboard.set_image(bitmap),
        ));

        if self.display_server.is_wayland() && self.clipboard_fallback {
            let wl_copy = self.locator.find(WL_COPY);
            let probe_path = wl_copy.clone();
            chain.push(Strategy::new(
                WL_COPY,
                self.clipboard_timeout,
                move || probe_path.is_some(),
                move |timeout| {
                    let program = wl_copy.as_deref().context("wl-copy not installed")?;
                    let png_file =
                        written_file.filter(|path| SaveFormat::from_path(path) == SaveFormat::Png);
                    let scratch;
                    let source = match png_file {
                        Some(path) => path,
                        None => {
                            scratch = temp_png(bitmap)?;
                            scratch.path()
                        }
                    };

                    // wl-copy forks a daemon that inherits stdout/stderr
                    let command = ProcessCommand::new(program)
                        .args(["--type", "image/png"])
                        .stdin_file(source)
                        .discard_output();
                    let output = self.runner.run(&command, timeout)?;
                    if !output.success() {
                        anyhow::bail!("wl-copy exited with status {:?}", output.exit_code);
                    }
                    Ok(())
                },
            ));
        }

        match chain.run() {
            Ok(success) => Ok(success.strategy),
            Err(exhausted) => {
                if !exhausted.unavailable.is_empty() {
                    log::warn!(
                        "Clipboard fallbacks not installed: {}",
                        exhausted.unavailable.join(", ")
                    );
                }
                Err(ExportError::ClipboardUnavailable {
                    attempted: exhausted.attempted(),
                })
            }
        }
    }
}
