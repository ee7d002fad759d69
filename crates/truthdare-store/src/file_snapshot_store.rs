//! File-backed implementation of the `SnapshotStore` trait.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use truthdare_core::error::DomainError;
use truthdare_core::repository::SnapshotStore;

/// Stores each snapshot as `<key>.json` inside one directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a reader never sees a half-written blob.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    dir: PathBuf,
}

impl JsonFileSnapshotStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the directory cannot be
    /// created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, &e))?;
        Ok(Self { dir })
    }

    /// The directory snapshots are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DomainError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(DomainError::Validation(format!(
                "invalid snapshot key {key:?}"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn save(&self, key: &str, blob: &str) -> Result<(), DomainError> {
        let path = self.path_for(key)?;
        let mut file = NamedTempFile::new_in(&self.dir).map_err(|e| io_error(&self.dir, &e))?;
        file.write_all(blob.as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| io_error(file.path(), &e))?;
        file.persist(&path).map_err(|e| io_error(&path, &e.error))?;
        debug!(path = %path.display(), bytes = blob.len(), "snapshot written");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, DomainError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, &e)),
        }
    }

    fn clear(&self, key: &str) -> Result<(), DomainError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, &e)),
        }
    }
}

fn io_error(path: &Path, e: &io::Error) -> DomainError {
    DomainError::Infrastructure(format!("{}: {e}", path.display()))
}
