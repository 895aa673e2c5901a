//! Sync Target Adapters
//!
//! Implementations of `SyncTargetPort`.

pub mod file_mirror;

pub use file_mirror::FileMirrorTarget;
