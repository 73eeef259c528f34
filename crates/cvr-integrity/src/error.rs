//! Error types for the integrity API.

use std::path::PathBuf;

use cvr_integrity_core::CoreError;
use cvr_integrity_store::StoreError;
use thiserror::Error;

/// Errors that can occur while recording or verifying exported records.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Invalid record id, file name or digest.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Filesystem error while reading an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking hashing task panicked or was cancelled.
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A record directory lacks the report file.
    #[error("missing report: {}", .0.display())]
    MissingReport(PathBuf),

    /// The export path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Result type for integrity operations.
pub type Result<T> = std::result::Result<T, IntegrityError>;
