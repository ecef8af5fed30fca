//! On-device key-value storage.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error")]
    Io(#[from] io::Error),

    #[error("stored value is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// String values addressed by short keys.
#[automock]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write or replace a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A directory with one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    private: bool,
}

impl FileStore {
    /// General-purpose storage.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            private: false,
        }
    }

    /// Storage readable only by the current user, used for credentials.
    pub fn private(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            private: true,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Create the directory. A private store's directory is owner-only.
    fn prepare_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        #[cfg(unix)]
        if self.private {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))?;
        }

        Ok(())
    }

    /// Write a fresh staging file. For a private store it is created 0600, so
    /// the value is never readable by others.
    fn stage(&self, staging: &Path, value: &str) -> Result<(), StorageError> {
        if let Err(error) = fs::remove_file(staging)
            && error.kind() != io::ErrorKind::NotFound
        {
            return Err(error.into());
        }

        let mut options = fs::OpenOptions::new();

        options.write(true).create_new(true);

        #[cfg(unix)]
        if self.private {
            use std::os::unix::fs::OpenOptionsExt;

            options.mode(0o600);
        }

        let mut file = options.open(staging)?;

        file.write_all(value.as_bytes())?;
        file.sync_all()?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;

        self.prepare_dir()?;

        let staging = path.with_extension("json.tmp");

        self.stage(&staging, value)?;
        fs::rename(&staging, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
