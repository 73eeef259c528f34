//! # CVR Integrity Core
//!
//! Pure primitives for tamper evidence over exported cast vote records:
//! record ids, leaf digests, the combinable hash, and the three-level
//! aggregation tree.
//!
//! This crate has no database and no async runtime. The only I/O it performs
//! is reading file content through [`FileFromDisk`].
//!
//! ## Key Types
//!
//! - [`CastVoteRecordId`] - Validated 36-character record id
//! - [`Sha256Hash`] - 32-byte digest, hex-rendered at every boundary
//! - [`NodeKey`] - Root, level-1, level-2 or leaf position in the tree
//! - [`HashTree`] - Tree materialized in one pass from its leaves
//!
//! ## Hashing
//!
//! ```rust
//! use cvr_integrity_core::{
//!     compute_single_cast_vote_record_hash, CastVoteRecordId, FileFromData, HashTree,
//! };
//!
//! let id = CastVoteRecordId::new("a1234567-0000-0000-0000-000000000000").unwrap();
//! let report = FileFromData::new("cast-vote-record-report.json", "a");
//! let leaf = compute_single_cast_vote_record_hash(&id, &report).unwrap();
//!
//! let tree = HashTree::from_leaves([(id, leaf)]);
//! assert!(tree.root().is_some());
//! ```

pub mod crypto;
pub mod error;
pub mod file;
pub mod leaf;
pub mod tree;
pub mod types;

pub use crypto::{compute_combined_hash, CombinableHash, Sha256Hash};
pub use error::{CoreError, Result};
pub use file::{FileFromData, FileFromDisk, HashableFile, ReadableFile};
pub use leaf::{
    compute_cast_vote_record_directory_hash, compute_single_cast_vote_record_hash,
    directory_summary,
};
pub use tree::{HashTree, NodeKey};
pub use types::{CastVoteRecordId, Level1Prefix, Level2Prefix, CAST_VOTE_RECORD_ID_LENGTH};
