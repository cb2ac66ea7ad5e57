//! Reading user-named files: the configuration file, the operation catalog
//! and the files behind `@path` / `%path` flag values.

use crate::error::Error;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only access to text files.
#[cfg_attr(test, mockall::automock)]
pub trait FileReader {
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not UTF-8.
    fn read_text(&self, path: &Path) -> io::Result<String>;

    fn is_file(&self, path: &Path) -> bool;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileReader for LocalFiles {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Expands `~` and environment variables in a user-supplied path.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set.
pub fn expand_path(path: &str) -> Result<PathBuf, Error> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| Error::invalid_config(format!("cannot expand path '{path}': {e}")))
}

/// Reads the file behind a `@path` or `%path` flag value.
///
/// # Errors
///
/// Returns a reason suitable for a flag-level usage issue.
pub fn read_value_file(files: &dyn FileReader, raw: &str) -> Result<String, String> {
    let expanded = shellexpand::full(raw).map_err(|e| format!("cannot expand path '{raw}': {e}"))?;
    let path = Path::new(expanded.as_ref());
    files
        .read_text(path)
        .map_err(|e| format!("cannot read file '{}': {e}", path.display()))
}
