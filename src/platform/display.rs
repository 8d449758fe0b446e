//! Display server family detection

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl DisplayServer {
    /// Detect from the process environment
    pub fn detect() -> Self {
        Self::detect_from(|key| std::env::var(key).ok())
    }

    /// Detect from `XDG_SESSION_TYPE`, then `WAYLAND_DISPLAY`, then `DISPLAY`
    pub fn detect_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match non_empty("XDG_SESSION_TYPE").as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("wayland") => return DisplayServer::Wayland,
            Some(kind) if kind.eq_ignore_ascii_case("x11") => return DisplayServer::X11,
            _ => {}
        }
        if non_empty("WAYLAND_DISPLAY").is_some() {
            DisplayServer::Wayland
        } else if non_empty("DISPLAY").is_some() {
            DisplayServer::X11
        } else {
            DisplayServer::Unknown
        }
    }

    pub fn is_wayland(self) -> bool {
        self == DisplayServer::Wayland
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(pairs: &[(&str, &str)]) -> DisplayServer {
        DisplayServer::detect_from(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn session_type_wins() {
        assert_eq!(
            detect(&[("XDG_SESSION_TYPE", "x11"), ("WAYLAND_DISPLAY", "wayland-0")]),
            DisplayServer::X11
        );
        assert_eq!(detect(&[("XDG_SESSION_TYPE", "Wayland")]), DisplayServer::Wayland);
    }

    #[test]
    fn falls_back_to_socket_variables() {
        assert_eq!(detect(&[("WAYLAND_DISPLAY", "wayland-1")]), DisplayServer::Wayland);
        assert_eq!(detect(&[("DISPLAY", ":0")]), DisplayServer::X11);
        assert_eq!(detect(&[("DISPLAY", "")]), DisplayServer::Unknown);
        assert_eq!(detect(&[("XDG_SESSION_TYPE", "tty")]), DisplayServer::Unknown);
    }
}
