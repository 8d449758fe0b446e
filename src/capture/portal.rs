//! Screenshot through `org.freedesktop.portal.Screenshot`

use std::collections::HashMap;
use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use zbus::zvariant::{OwnedValue, Value};

use crate::error::CaptureError;

use super::frame::{FrameBuffer, decode_file};

const PORTAL_DEST: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const SCREENSHOT_IFACE: &str = "org.freedesktop.portal.Screenshot";
const REQUEST_IFACE: &str = "org.freedesktop.portal.Request";

/// Desktop screenshot service that writes a file and reports its location
pub trait ScreenshotPortal {
    fn is_available(&self) -> bool;

    /// Request a full-desktop screenshot, waiting at most `timeout` for the answer
    fn request(&self, timeout: Duration) -> Result<PathBuf, CaptureError>;
}

/// [`ScreenshotPortal`] over the D-Bus session bus
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopPortal;

impl ScreenshotPortal for DesktopPortal {
    fn is_available(&self) -> bool {
        let bus_env = std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some_and(|v| !v.is_empty());
        let bus_socket = std::env::var_os("XDG_RUNTIME_DIR")
            .map(|dir| Path::new(&dir).join("bus").exists())
            .unwrap_or(false);
        bus_env || bus_socket
    }

    fn request(&self, timeout: Duration) -> Result<PathBuf, CaptureError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let uri = runtime.block_on(async {
            tokio::time::timeout(timeout, request_screenshot())
                .await
                .map_err(|_| CaptureError::ToolTimeout {
                    tool: "xdg-desktop-portal".to_string(),
                    timeout,
                })?
        })?;
        log::debug!("Portal returned {}", uri);

        file_uri_to_path(&uri)
            .ok_or_else(|| CaptureError::Portal(format!("unsupported result uri {uri}")))
    }
}

fn portal_err(err: zbus::Error) -> CaptureError {
    CaptureError::Portal(err.to_string())
}

async fn request_screenshot() -> Result<String, CaptureError> {
    let connection = zbus::Connection::session().await.map_err(portal_err)?;

    let sender = connection
        .unique_name()
        .map(|name| name.as_str().trim_start_matches(':').replace('.', "_"))
        .ok_or_else(|| CaptureError::Portal("connection has no unique name".to_string()))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let token = format!("snapmark_{}_{}", std::process::id(), nanos);
    let request_path = format!("{PORTAL_PATH}/request/{sender}/{token}");

    // Subscribe before calling so a fast Response is not missed
    let rule = zbus::MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .interface(REQUEST_IFACE)
        .map_err(portal_err)?
        .member("Response")
        .map_err(portal_err)?
        .path(request_path.as_str())
        .map_err(portal_err)?
        .build();
    let mut responses = zbus::MessageStream::for_match_rule(rule, &connection, None)
        .await
        .map_err(portal_err)?;

    let mut options: HashMap<&str, Value<'_>> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));
    options.insert("interactive", Value::from(false));
    connection
        .call_method(
            Some(PORTAL_DEST),
            PORTAL_PATH,
            Some(SCREENSHOT_IFACE),
            "Screenshot",
            &("", options),
        )
        .await
        .map_err(portal_err)?;

    let Some(message) = responses.next().await else {
        return Err(CaptureError::Portal(
            "bus closed before the portal answered".to_string(),
        ));
    };
    let message = message.map_err(portal_err)?;
    let (response, results): (u32, HashMap<String, OwnedValue>) =
        message.body().deserialize().map_err(portal_err)?;

    if response != 0 {
        return Err(CaptureError::Portal(format!(
            "request was denied or cancelled (response {response})"
        )));
    }
    results
        .get("uri")
        .and_then(|value| match &**value {
            Value::Str(uri) => Some(uri.as_str().to_string()),
            _ => None,
        })
        .ok_or_else(|| CaptureError::Portal("response carried no uri".to_string()))
}

/// Wait up to `wait` for the portal's file to be non-empty, decode it and
/// remove it
pub fn collect_portal_file(path: &Path, wait: Duration) -> Result<FrameBuffer, CaptureError> {
    // Removed on every exit path
    let file = tempfile::TempPath::from_path(path);

    let deadline = Instant::now() + wait;
    loop {
        let len = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
        if len > 0 {
            break;
        }
        if Instant::now() >= deadline {
            return Err(CaptureError::Portal(format!(
                "{} was still empty after {:?}",
                path.display(),
                wait
            )));
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    decode_file(&file, "xdg-desktop-portal")
}

/// `file://` URI to a local path, decoding `%XX` escapes
fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    let bytes = rest.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    Some(PathBuf::from(OsString::from_vec(decoded)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_uri_is_decoded() {
        assert_eq!(
            file_uri_to_path("file:///home/me/Pictures/Screenshot%20from%20today.png"),
            Some(PathBuf::from("/home/me/Pictures/Screenshot from today.png"))
        );
        assert_eq!(file_uri_to_path("https://example.com/x.png"), None);
        assert_eq!(file_uri_to_path("file:///tmp/bad%zz.png"), None);
    }

    #[test]
    fn portal_file_is_decoded_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Screenshot.png");
        image::RgbaImage::new(2, 2).save(&path).unwrap();

        let frame = collect_portal_file(&path, Duration::from_millis(200)).unwrap();
        assert_eq!((frame.width(), frame.height()), (2, 2));
        assert!(!path.exists());
    }

    #[test]
    fn empty_portal_file_times_out_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Screenshot.png");
        std::fs::write(&path, b"").unwrap();

        let err = collect_portal_file(&path, Duration::from_millis(150)).unwrap_err();
        assert!(matches!(err, CaptureError::Portal(_)));
        assert!(!path.exists());
    }
}
