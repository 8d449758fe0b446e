//! Save-as dialog used when a screenshot is written to a file

use std::path::{Path, PathBuf};

/// Native "save as" dialog
pub trait FileChooser {
    /// `None` when the user cancelled
    fn choose_save_path(&self, suggested: &Path) -> Option<PathBuf>;
}

/// [`FileChooser`] backed by the desktop's file dialog through `rfd`
#[derive(Debug, Clone)]
pub struct RfdFileChooser {
    title: String,
}

impl Default for RfdFileChooser {
    fn default() -> Self {
        Self {
            title: "Save Screenshot".to_string(),
        }
    }
}

impl FileChooser for RfdFileChooser {
    fn choose_save_path(&self, suggested: &Path) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title(&self.title)
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp"]);
        if let Some(dir) = suggested.parent() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = suggested.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }

        let chosen = dialog.save_file();
        if chosen.is_none() {
            log::info!("Save dialog cancelled");
        }
        chosen
    }
}
