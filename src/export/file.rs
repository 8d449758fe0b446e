//! Saving screenshots to disk

use std::fs::OpenOptions;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use super::ExportSink;
use crate::error::ExportError;
use crate::platform::FileChooser;

/// Give up on a directory after this many taken names
const MAX_NAME_COLLISIONS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
}

impl SaveFormat {
    /// Format named by the path's extension, PNG when unknown
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jpg" | "jpeg") => SaveFormat::Jpeg,
            Some("bmp") => SaveFormat::Bmp,
            _ => SaveFormat::Png,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
        }
    }
}

pub(crate) fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Encode the whole bitmap in memory before anything touches the disk
pub fn encode(image: &RgbaImage, format: SaveFormat) -> Result<Vec<u8>, ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::EncodeFailure("image has no pixels".to_string()));
    }

    let mut bytes = Vec::new();
    match format {
        SaveFormat::Png => write_png(&mut bytes, image)
            .map_err(|err| ExportError::EncodeFailure(err.to_string()))?,
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
                .map_err(|err| ExportError::EncodeFailure(err.to_string()))?
        }
        SaveFormat::Bmp => image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)
            .map_err(|err| ExportError::EncodeFailure(err.to_string()))?,
    }
    Ok(bytes)
}

/// Fallback directories in preference order
pub fn default_save_dirs() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    [
        dirs::picture_dir(),
        dirs::desktop_dir(),
        dirs::home_dir(),
        exe_dir,
        Some(std::env::temp_dir()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn timestamped_stem() -> String {
    chrono::Local::now()
        .format("Screenshot_%Y-%m-%d_%H-%M-%S")
        .to_string()
}

/// Create `dir/stem.ext`, or `stem-1.ext`, `stem-2.ext`... if taken
fn create_unique(dir: &Path, stem: &str, ext: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    for n in 0..MAX_NAME_COLLISIONS {
        let name = if n == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}-{n}.{ext}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(err) = file.write_all(bytes) {
                    // Leave no truncated image behind
                    let _ = std::fs::remove_file(&path);
                    return Err(err);
                }
                return Ok(path);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{MAX_NAME_COLLISIONS} names taken in {}", dir.display()),
    ))
}

impl ExportSink {
    /// Path offered to the save dialog
    pub fn suggested_path(&self) -> PathBuf {
        let name = format!("{}.{}", timestamped_stem(), SaveFormat::Png.extension());
        match self.save_dirs.first() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Save `bitmap` to the first writable location
    ///
    /// The requested path is tried first and overwritten if it exists. The
    /// fallback directories get a timestamped name that never replaces an
    /// existing file.
    pub fn export_to_file(
        &self,
        bitmap: &RgbaImage,
        requested: Option<&Path>,
    ) -> Result<PathBuf, ExportError> {
        let format = requested.map_or(SaveFormat::Png, SaveFormat::from_path);
        let bytes = encode(bitmap, format)?;
        let mut attempted = Vec::new();

        if let Some(path) = requested {
            match std::fs::write(path, &bytes) {
                Ok(()) => {
                    log::info!("Saved screenshot to {}", path.display());
                    return Ok(path.to_path_buf());
                }
                Err(err) => {
                    log::warn!("Cannot write {}: {}", path.display(), err);
                    attempted.push(path.to_path_buf());
                }
            }
        }

        let stem = timestamped_stem();
        for dir in &self.save_dirs {
            match create_unique(dir, &stem, format.extension(), &bytes) {
                Ok(path) => {
                    log::info!("Saved screenshot to {}", path.display());
                    return Ok(path);
                }
                Err(err) => {
                    log::warn!("Cannot save into {}: {}", dir.display(), err);
                    attempted.push(dir.join(format!("{stem}.{}", format.extension())));
                }
            }
        }

        Err(ExportError::NoWritableLocation { attempted })
    }

    /// Ask for a path, then save there; `Ok(None)` if the dialog was cancelled
    pub fn save_with_chooser(
        &self,
        bitmap: &RgbaImage,
        chooser: &dyn FileChooser,
    ) -> Result<Option<PathBuf>, ExportError> {
        let Some(path) = chooser.choose_save_path(&self.suggested_path()) else {
            return Ok(None);
        };
        self.export_to_file(bitmap, Some(path.as_path())).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::{FakeClipboard, bitmap, sink};
    use crate::platform::DisplayServer;
    use std::cell::RefCell;
    use std::sync::Arc;

    fn sink_saving_to(dirs: Vec<PathBuf>) -> ExportSink {
        sink(
            DisplayServer::X11,
            FakeClipboard::new(true),
            Arc::default(),
            Vec::new(),
            dirs,
        )
    }

    struct ScriptedChooser {
        answer: Option<PathBuf>,
        suggested: RefCell<Option<PathBuf>>,
    }

    impl FileChooser for ScriptedChooser {
        fn choose_save_path(&self, suggested: &Path) -> Option<PathBuf> {
            *self.suggested.borrow_mut() = Some(suggested.to_path_buf());
            self.answer.clone()
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(SaveFormat::from_path(Path::new("a.JPG")), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_path(Path::new("a.jpeg")), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_path(Path::new("a.bmp")), SaveFormat::Bmp);
        assert_eq!(SaveFormat::from_path(Path::new("a.png")), SaveFormat::Png);
        assert_eq!(SaveFormat::from_path(Path::new("noext")), SaveFormat::Png);
    }

    #[test]
    fn encoders_emit_their_signatures() {
        let png = encode(&bitmap(), SaveFormat::Png).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let jpeg = encode(&bitmap(), SaveFormat::Jpeg).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let bmp = encode(&bitmap(), SaveFormat::Bmp).unwrap();
        assert_eq!(&bmp[..2], b"BM");
    }

    #[test]
    fn empty_bitmap_is_an_encode_failure() {
        let err = encode(&RgbaImage::new(0, 0), SaveFormat::Png).unwrap_err();
        assert!(matches!(err, ExportError::EncodeFailure(_)));
    }

    #[test]
    fn name_collisions_get_numeric_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let first = create_unique(dir.path(), "shot", "png", b"a").unwrap();
        let second = create_unique(dir.path(), "shot", "png", b"b").unwrap();
        let third = create_unique(dir.path(), "shot", "png", b"c").unwrap();
        assert_eq!(first, dir.path().join("shot.png"));
        assert_eq!(second, dir.path().join("shot-1.png"));
        assert_eq!(third, dir.path().join("shot-2.png"));
        assert_eq!(std::fs::read(&first).unwrap(), b"a");
    }

    #[test]
    fn requested_path_is_used_and_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mine.png");
        let saved = sink_saving_to(Vec::new())
            .export_to_file(&bitmap(), Some(target.as_path()))
            .unwrap();
        assert_eq!(saved, target);
        assert_eq!(image::open(&saved).unwrap().to_rgba8(), bitmap());
    }

    #[test]
    fn unwritable_request_falls_back_to_save_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let saved = sink_saving_to(vec![dir.path().to_path_buf()])
            .export_to_file(&bitmap(), Some(Path::new("/nonexistent/dir/shot.bmp")))
            .unwrap();
        assert_eq!(saved.parent(), Some(dir.path()));
        // The requested encoding is kept for the fallback name
        assert_eq!(saved.extension().and_then(|e| e.to_str()), Some("bmp"));
        let name = saved.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Screenshot_"), "{name}");
    }

    #[test]
    fn later_dirs_are_tried_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let saved = sink_saving_to(vec![
            PathBuf::from("/nonexistent/pictures"),
            dir.path().to_path_buf(),
        ])
        .export_to_file(&bitmap(), None)
        .unwrap();
        assert_eq!(saved.parent(), Some(dir.path()));
    }

    #[test]
    fn no_writable_location_lists_every_attempt() {
        let err = sink_saving_to(vec![
            PathBuf::from("/nonexistent/a"),
            PathBuf::from("/nonexistent/b"),
        ])
        .export_to_file(&bitmap(), Some(Path::new("/nonexistent/c/x.png")))
        .unwrap_err();
        let ExportError::NoWritableLocation { attempted } = err else {
            panic!("wrong error variant");
        };
        assert_eq!(attempted.len(), 3);
        assert_eq!(attempted[0], PathBuf::from("/nonexistent/c/x.png"));
        assert!(attempted[1].starts_with("/nonexistent/a"));
    }

    #[test]
    fn cancelled_chooser_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let chooser = ScriptedChooser {
            answer: None,
            suggested: RefCell::new(None),
        };
        let result = sink_saving_to(vec![dir.path().to_path_buf()])
            .save_with_chooser(&bitmap(), &chooser)
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let suggested = chooser.suggested.borrow().clone().unwrap();
        assert_eq!(suggested.parent(), Some(dir.path()));
    }

    #[test]
    fn chosen_path_receives_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("picked.jpg");
        let chooser = ScriptedChooser {
            answer: Some(target.clone()),
            suggested: RefCell::new(None),
        };
        let result = sink_saving_to(Vec::new())
            .save_with_chooser(&bitmap(), &chooser)
            .unwrap();
        assert_eq!(result, Some(target.clone()));
        assert_eq!(&std::fs::read(&target).unwrap()[..2], &[0xFF, 0xD8]);
    }
}
