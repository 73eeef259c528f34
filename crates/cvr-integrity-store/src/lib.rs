//! # CVR Integrity Store
//!
//! Incrementally maintained hash tree over exported cast vote records. Each
//! export updates one leaf and the three aggregates above it, so the root is
//! always current without rehashing the whole export.
//!
//! ## Key Types
//!
//! - [`HashStore`] - The trait for all tree storage operations
//! - [`SqliteHashStore`] - SQLite-based persistent storage
//! - [`MemoryHashStore`] - In-memory storage for tests
//! - [`ChildSelector`] - Typed child lookup for one tree node
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cvr_integrity_core::{CastVoteRecordId, Sha256Hash};
//! use cvr_integrity_store::{HashStore, SqliteHashStore};
//!
//! let mut store = SqliteHashStore::open("cvr-hashes.db").unwrap();
//! let id = CastVoteRecordId::new("a1234567-0000-0000-0000-000000000000").unwrap();
//! store.update_cast_vote_record_hashes(&id, Sha256Hash::empty()).unwrap();
//! println!("{}", store.get_cast_vote_record_root_hash().unwrap());
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod selector;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryHashStore;
pub use selector::ChildSelector;
pub use sqlite::SqliteHashStore;
pub use traits::HashStore;
