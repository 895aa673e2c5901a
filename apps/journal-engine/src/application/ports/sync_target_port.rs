//! Sync Target Port (Driven Port)
//!
//! An external, user-chosen location the journal bundle is mirrored to.

use async_trait::async_trait;
use thiserror::Error;

/// Mirror error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Write permission on the target is gone.
    #[error("Permission to write '{target}' was revoked: {reason}")]
    PermissionRevoked {
        /// Target name.
        target: String,
        /// Why the permission check failed.
        reason: String,
    },

    /// Writing failed for another reason.
    #[error("Sync I/O error: {message}")]
    Io {
        /// Error details.
        message: String,
    },

    /// No target is connected, or it was deactivated.
    #[error("Sync is not active")]
    Inactive,

    /// The bundle could not be serialized.
    #[error("Bundle serialization error: {message}")]
    Serialize {
        /// Error details.
        message: String,
    },
}

/// Port for the external mirror.
#[async_trait]
pub trait SyncTargetPort: Send + Sync {
    /// Display name of the target (the file name).
    fn name(&self) -> String;

    /// Verify that the target can still be written.
    async fn check_permission(&self) -> Result<(), SyncError>;

    /// Replace the target's contents.
    async fn write(&self, contents: &str) -> Result<(), SyncError>;
}
