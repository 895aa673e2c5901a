//! Local file mirror target.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{SyncError, SyncTargetPort};

/// Mirrors the bundle to a user-chosen file.
///
/// Permission holds while the parent directory exists and the file, if it
/// exists, is not read-only.
#[derive(Debug, Clone)]
pub struct FileMirrorTarget {
    path: PathBuf,
}

impl FileMirrorTarget {
    /// Create a target for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn revoked(&self, reason: impl Into<String>) -> SyncError {
        SyncError::PermissionRevoked {
            target: self.name(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SyncTargetPort for FileMirrorTarget {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    async fn check_permission(&self) -> Result<(), SyncError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        match tokio::fs::metadata(&parent).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(self.revoked("parent is not a directory")),
            Err(e) => return Err(self.revoked(e.to_string())),
        }

        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.permissions().readonly() => Err(self.revoked("file is read-only")),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.revoked(e.to_string())),
        }
    }

    async fn write(&self, contents: &str) -> Result<(), SyncError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let result = async {
            tokio::fs::write(&tmp, contents).await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        result.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => self.revoked(e.to_string()),
            _ => SyncError::Io {
                message: e.to_string(),
            },
        })
    }
}
