//! # CVR Integrity
//!
//! Tamper evidence for exported cast vote records.
//!
//! ## Overview
//!
//! Every exported record gets a leaf digest over its files and their
//! location. Leaves are aggregated into a three-level tree keyed by id
//! prefix, and the tree's root is written into the export's metadata. An
//! auditor holding only the export can recompute the root and compare.
//!
//! - **Incremental**: [`IntegrityLedger`] updates one leaf and its three
//!   ancestors per exported record, inside one store transaction.
//! - **From scratch**: [`FromScratchVerifier`] rebuilds the whole tree from
//!   the export directory without touching any store.
//!
//! Both paths must produce the same root for the same records.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cvr_integrity::{IntegrityConfig, IntegrityLedger};
//! use cvr_integrity::core::{CastVoteRecordId, FileFromData};
//! use cvr_integrity::store::SqliteHashStore;
//!
//! async fn example() {
//!     let store = SqliteHashStore::open("cvr-hashes.db").unwrap();
//!     let mut ledger = IntegrityLedger::new(store, IntegrityConfig::default());
//!
//!     let id = CastVoteRecordId::new("a1234567-0000-0000-0000-000000000000").unwrap();
//!     let report = FileFromData::new("cast-vote-record-report.json", "{}");
//!     ledger.record_exported(&id, &[&report]).unwrap();
//!
//!     let report = ledger.verify("/media/usb/export").await.unwrap();
//!     assert!(report.is_consistent());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `cvr_integrity::core` - Ids, digests, leaf hashing, tree aggregation
//! - `cvr_integrity::store` - Hash store trait, SQLite and in-memory stores

pub mod config;
pub mod error;
pub mod ledger;
pub mod listing;
pub mod verifier;

// Re-export component crates
pub use cvr_integrity_core as core;
pub use cvr_integrity_store as store;

pub use config::{IntegrityConfig, ReadMode, DEFAULT_REPORT_FILE_NAME};
pub use error::{IntegrityError, Result};
pub use ledger::{IntegrityLedger, VerificationReport};
pub use listing::{RecordIdLister, SubdirectoryLister};
pub use verifier::{compute_cast_vote_record_root_hash_from_scratch, FromScratchVerifier};

// Re-export commonly used core types
pub use cvr_integrity_core::{
    compute_cast_vote_record_directory_hash, compute_combined_hash,
    compute_single_cast_vote_record_hash, CastVoteRecordId, CombinableHash, FileFromData,
    FileFromDisk, HashableFile, ReadableFile, Sha256Hash,
};
pub use cvr_integrity_store::{HashStore, MemoryHashStore, SqliteHashStore};
