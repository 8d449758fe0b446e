//! Runtime configuration for capture, selection and export
//!
//! Nothing here is persisted. Defaults can be overridden from `SNAPMARK_*`
//! environment variables; malformed values are logged and ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serializable color representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self::RED
    }
}

impl ShapeColor {
    pub const RED: ShapeColor = ShapeColor {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: f32::from(channel(0)?) / 255.0,
            g: f32::from(channel(2)?) / 255.0,
            b: f32::from(channel(4)?) / 255.0,
        })
    }
}

/// Application configuration for one process
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Timeout for screenshot tools that return immediately (grim, scrot, ...)
    pub fast_tool_timeout_ms: u64,
    /// Timeout for tools that may go through a portal or confirmation step
    pub interactive_tool_timeout_ms: u64,
    /// Bound on the native display grab, used for the time budget
    pub native_timeout_ms: u64,
    /// Wait for the desktop portal to answer a screenshot request
    pub portal_timeout_ms: u64,
    /// Wait for the portal's result file to become readable
    pub portal_file_wait_ms: u64,
    /// Selections narrower or shorter than this are snapped
    pub min_selection_size: i32,
    /// Side length of the square a too-small selection snaps to
    pub snap_selection_size: i32,
    /// Colour for new annotations
    pub annotation_color: ShapeColor,
    /// Block size of mosaic annotations
    pub mosaic_block_size: u32,
    /// Whether to fall back to wl-copy when the native clipboard fails on Wayland
    pub clipboard_fallback: bool,
    /// Timeout for the clipboard bridge tool
    pub clipboard_timeout_ms: u64,
    /// How long the text prompt may stay open
    pub prompt_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fast_tool_timeout_ms: 5_000,
            interactive_tool_timeout_ms: 10_000,
            native_timeout_ms: 5_000,
            portal_timeout_ms: 10_000,
            portal_file_wait_ms: 2_000,
            min_selection_size: 5,
            snap_selection_size: 100,
            annotation_color: ShapeColor::RED,
            mosaic_block_size: 10,
            clipboard_fallback: true,
            clipboard_timeout_ms: 5_000,
            prompt_timeout_ms: 300_000,
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `SNAPMARK_*` keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        override_with(&lookup, "SNAPMARK_TOOL_TIMEOUT_MS", &mut config.fast_tool_timeout_ms);
        override_with(
            &lookup,
            "SNAPMARK_INTERACTIVE_TIMEOUT_MS",
            &mut config.interactive_tool_timeout_ms,
        );
        override_with(&lookup, "SNAPMARK_PORTAL_TIMEOUT_MS", &mut config.portal_timeout_ms);
        override_with(&lookup, "SNAPMARK_MIN_SELECTION", &mut config.min_selection_size);
        override_with(&lookup, "SNAPMARK_SNAP_SELECTION", &mut config.snap_selection_size);
        override_with(&lookup, "SNAPMARK_MOSAIC_BLOCK", &mut config.mosaic_block_size);
        override_with(
            &lookup,
            "SNAPMARK_CLIPBOARD_FALLBACK",
            &mut config.clipboard_fallback,
        );

        if let Some(raw) = lookup("SNAPMARK_COLOR") {
            match ShapeColor::from_hex(&raw) {
                Some(color) => config.annotation_color = color,
                None => log::warn!("Ignoring SNAPMARK_COLOR={raw:?}: expected #rrggbb"),
            }
        }

        if config.min_selection_size < 1 {
            log::warn!("min_selection_size must be positive, using 1");
            config.min_selection_size = 1;
        }
        if config.snap_selection_size < config.min_selection_size {
            config.snap_selection_size = config.min_selection_size;
        }
        if config.mosaic_block_size == 0 {
            config.mosaic_block_size = 1;
        }

        config
    }

    pub fn fast_tool_timeout(&self) -> Duration {
        Duration::from_millis(self.fast_tool_timeout_ms)
    }

    pub fn interactive_tool_timeout(&self) -> Duration {
        Duration::from_millis(self.interactive_tool_timeout_ms)
    }

    pub fn native_timeout(&self) -> Duration {
        Duration::from_millis(self.native_timeout_ms)
    }

    pub fn portal_timeout(&self) -> Duration {
        Duration::from_millis(self.portal_timeout_ms)
    }

    pub fn portal_file_wait(&self) -> Duration {
        Duration::from_millis(self.portal_file_wait_ms)
    }

    pub fn clipboard_timeout(&self) -> Duration {
        Duration::from_millis(self.clipboard_timeout_ms)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.prompt_timeout_ms)
    }
}

fn override_with<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => log::warn!("Ignoring {key}={raw:?}: could not parse, using default"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_capture_timeouts() {
        let config = Config::default();
        assert_eq!(config.fast_tool_timeout(), Duration::from_secs(5));
        assert_eq!(config.interactive_tool_timeout(), Duration::from_secs(10));
        assert_eq!(config.min_selection_size, 5);
        assert_eq!(config.annotation_color.to_rgba_u8(), [255, 0, 0, 255]);
    }

    #[test]
    fn lookup_overrides_known_keys() {
        let config = Config::from_lookup(lookup_from(&[
            ("SNAPMARK_TOOL_TIMEOUT_MS", "1500"),
            ("SNAPMARK_COLOR", "#00ff00"),
            ("SNAPMARK_CLIPBOARD_FALLBACK", "false"),
        ]));
        assert_eq!(config.fast_tool_timeout_ms, 1500);
        assert_eq!(config.annotation_color.to_rgba_u8(), [0, 255, 0, 255]);
        assert!(!config.clipboard_fallback);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("SNAPMARK_TOOL_TIMEOUT_MS", "soon"),
            ("SNAPMARK_COLOR", "red"),
            ("SNAPMARK_MIN_SELECTION", "-3"),
        ]));
        assert_eq!(config.fast_tool_timeout_ms, 5_000);
        assert_eq!(config.annotation_color, ShapeColor::RED);
        assert_eq!(config.min_selection_size, 1);
    }
}
