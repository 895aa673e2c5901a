//! File-backed document storage.
//!
//! Each key is one `<key>.json` file in the data directory. Writes go to a
//! sibling temp file that is then renamed over the target, so a crash never
//! leaves a half-written document behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::application::ports::{LocalStoragePort, StorageError};

/// File-backed implementation of `LocalStoragePort`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
            key: dir.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(dir = %dir.display(), "File storage opened");
        Ok(Self { dir })
    }

    /// Data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStoragePort for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let io_err = |e: std::io::Error| StorageError::Io {
            key: key.to_string(),
            message: e.to_string(),
        };

        fs::write(&tmp, contents).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }
}
