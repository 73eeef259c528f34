//! Error types for the CVR integrity core.

use thiserror::Error;

/// Errors that can occur while building ids, node keys, or digests.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cast vote record id failed validation.
    #[error("invalid cast vote record id {id:?}: {reason}")]
    InvalidRecordId { id: String, reason: &'static str },

    /// A file name cannot appear in a directory summary.
    #[error("invalid file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    /// A hex digest could not be parsed.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A column combination does not describe any tree node.
    #[error("invalid node key ({level1:?}, {level2:?}, {cvr_id:?})")]
    InvalidNodeKey {
        level1: String,
        level2: String,
        cvr_id: String,
    },

    /// Reading file content failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
