//! Upload directory management.
//!
//! Stored files live flat in one directory under random alphanumeric names.
//! A candidate name is only used after checking that nothing occupies it;
//! the final move uses no-clobber semantics so a concurrent writer that
//! slips in between check and write costs one more candidate instead of an
//! overwrite.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use ba_core::{Error, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Filesystem store for normalized uploads.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    name_length: usize,
}

impl UploadStore {
    /// Create a store writing to `dir` with names of `name_length` characters.
    pub fn new(dir: PathBuf, name_length: usize) -> Self {
        Self { dir, name_length }
    }

    /// Directory files are written to.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Create the upload directory if it does not exist.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Internal(format!(
                "Failed to create upload directory {}: {e}",
                self.dir.display()
            ))
        })
    }

    /// Absolute path of a stored file.
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Whether a stored file exists.
    pub fn exists(&self, file: &str) -> bool {
        self.path_of(file).exists()
    }

    /// Write `bytes` under a fresh random name ending in `extension`.
    ///
    /// Returns the chosen filename, relative to the store directory.
    pub fn write_unique(&self, bytes: &[u8], extension: &str) -> Result<String> {
        loop {
            let file = self.free_name(extension);

            let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
            tmp.write_all(bytes)?;
            tmp.as_file().sync_all()?;

            match tmp.persist_noclobber(self.path_of(&file)) {
                Ok(_) => return Ok(file),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("Upload name {file} taken while writing; retrying");
                }
                Err(e) => return Err(Error::from(e.error)),
            }
        }
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub fn remove(&self, file: &str) -> Result<()> {
        match std::fs::remove_file(self.path_of(file)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Generate candidate names until one is not occupied on disk.
    fn free_name(&self, extension: &str) -> String {
        loop {
            let file = format!("{}{extension}", random_name(self.name_length));
            if !self.exists(&file) {
                return file;
            }
        }
    }
}

fn random_name(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
