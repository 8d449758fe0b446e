//! Probing for optional external tools

use std::path::{Path, PathBuf};

use super::process::is_executable;

/// Directories searched before `$PATH`, in order
const STANDARD_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin"];

/// Answers whether an external tool is installed
///
/// A missing tool is never an error; it only removes the tool from a strategy
/// ranking.
pub trait ToolLocator {
    fn exists(&self, path: &Path) -> bool;

    /// Directories searched by [`find`](Self::find)
    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = STANDARD_DIRS.iter().map(PathBuf::from).collect();
        if let Some(path) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path) {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
        dirs
    }

    /// First existing `dir/program` across [`search_dirs`](Self::search_dirs)
    fn find(&self, program: &str) -> Option<PathBuf> {
        self.search_dirs()
            .into_iter()
            .map(|dir| dir.join(program))
            .find(|candidate| self.exists(candidate))
    }
}

/// [`ToolLocator`] that checks the real filesystem for executables
#[derive(Debug, Clone, Copy, Default)]
pub struct FsToolLocator;

impl ToolLocator for FsToolLocator {
    fn exists(&self, path: &Path) -> bool {
        is_executable(path)
    }
}
