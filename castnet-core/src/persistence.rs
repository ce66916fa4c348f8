//! Shared persistence utilities: atomic file writes, JSON load/save, and
//! staged directory publication.
//!
//! Every artifact castnet writes goes through a `.tmp` sibling (files) or a
//! hidden staging directory (snapshot bundles) and is renamed into place
//! last, so a reader never observes a half-written result.

use std::io;
use std::path::{Path, PathBuf};

/// Atomically write JSON data to a file.
///
/// Serializes `data` to pretty-printed JSON, writes to a `.tmp` sibling file,
/// then renames to the target path. Creates parent directories if needed.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    atomic_write(path, json.as_bytes())
}

/// Atomically write raw bytes to a file.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load and deserialize JSON from a file.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let value =
        serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

/// A directory that is populated under a hidden name and only becomes
/// visible at its final path on [`StagedDir::publish`].
///
/// Dropping an unpublished stage removes the partial directory.
#[derive(Debug)]
pub struct StagedDir {
    staging: PathBuf,
    target: PathBuf,
    published: bool,
}

impl StagedDir {
    /// Create a fresh staging directory next to `target`.
    ///
    /// Fails with `AlreadyExists` if `target` is already present.
    pub fn create(target: &Path) -> io::Result<Self> {
        if target.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            ));
        }
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stage".to_string());
        let staging = parent.join(format!(".{name}.partial"));
        if staging.exists() {
            // Leftover from an interrupted write; it was never published.
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir(&staging)?;
        Ok(Self {
            staging,
            target: target.to_path_buf(),
            published: false,
        })
    }

    /// Path of a file inside the staging area.
    pub fn path(&self, file: &str) -> PathBuf {
        self.staging.join(file)
    }

    /// Rename the staging directory to its final location.
    pub fn publish(mut self) -> io::Result<PathBuf> {
        if self.target.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", self.target.display()),
            ));
        }
        std::fs::rename(&self.staging, &self.target)?;
        self.published = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedDir {
    fn drop(&mut self) {
        if !self.published {
            let _ = std::fs::remove_dir_all(&self.staging);
        }
    }
}
