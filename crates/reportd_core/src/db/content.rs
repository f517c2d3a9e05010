//! Flat one-file-per-report content store.

use crate::constants::{REPORT_FILE_EXTENSION, TEMP_FILE_SUFFIX};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A content file found on disk, with the timestamps the filesystem recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Reads and writes report bodies under a single directory.
pub struct ContentStore {
    root: PathBuf,
}

fn temp_name(location: &str) -> String {
    format!(".{}{}", location, TEMP_FILE_SUFFIX)
}

impl ContentStore {
    /// Bind a store to `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the content files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or `root` exists
    /// but is not a directory.
    pub fn ensure_root(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root)?;
        if !self.root.is_dir() {
            return Err(AppError::StorageMessage(format!(
                "Reports path {} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    fn path_for(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }

    /// Replace the bytes stored at `location`.
    ///
    /// Bytes are written to a hidden sibling and renamed into place, so readers
    /// observe either the previous body or the new one, never a prefix.
    ///
    /// # Errors
    /// Returns an error when the temp file cannot be written or renamed. The
    /// temp file is removed on failure.
    pub fn write(&self, location: &str, bytes: &[u8]) -> Result<(), AppError> {
        let target = self.path_for(location);
        let temp = self.path_for(&temp_name(location));

        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&temp, &target)
        })();

        if let Err(err) = result {
            if temp.is_file() {
                if let Err(cleanup_err) = fs::remove_file(&temp) {
                    tracing::warn!(
                        "Failed to remove temp file {}: {}",
                        temp.display(),
                        cleanup_err
                    );
                }
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Read the bytes stored at `location`.
    ///
    /// # Returns
    /// `Ok(None)` when nothing is stored there.
    ///
    /// # Errors
    /// Returns an error for any failure other than a missing file.
    pub fn read(&self, location: &str) -> Result<Option<Vec<u8>>, AppError> {
        match fs::read(self.path_for(location)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the content at `location`.
    ///
    /// # Returns
    /// `Ok(true)` when a file was removed, `Ok(false)` when it was already gone.
    ///
    /// # Errors
    /// Returns an error for any failure other than a missing file.
    pub fn delete(&self, location: &str) -> Result<bool, AppError> {
        match fs::remove_file(self.path_for(location)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// List every report file currently on disk.
    ///
    /// Hidden files (including in-progress writes) and files without the
    /// report extension are skipped. Creation time falls back to modification
    /// time on filesystems that do not record it.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be read.
    pub fn enumerate(&self) -> Result<Vec<StoredContent>, AppError> {
        let mut found = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let Ok(name) = dir_entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(&format!(".{}", REPORT_FILE_EXTENSION))
            {
                continue;
            }
            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            let created = metadata.created().unwrap_or(modified);
            found.push(StoredContent {
                location: name,
                created_at: DateTime::<Utc>::from(created),
                modified_at: DateTime::<Utc>::from(modified),
            });
        }
        found.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(found)
    }

    /// Remove leftovers of writes interrupted by a crash.
    ///
    /// # Returns
    /// Number of temp files removed.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be read.
    pub fn remove_stale_temp_files(&self) -> Result<usize, AppError> {
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let name = name.to_string_lossy();
            if !(name.starts_with('.') && name.ends_with(TEMP_FILE_SUFFIX)) {
                continue;
            }
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            match fs::remove_file(dir_entry.path()) {
                Ok(()) => removed += 1,
                Err(err) => tracing::warn!("Failed to remove stale temp file {}: {}", name, err),
            }
        }
        Ok(removed)
    }
}
