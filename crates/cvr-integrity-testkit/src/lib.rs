//! # CVR Integrity Testkit
//!
//! Testing utilities for CVR integrity.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known records with the roots every implementation must derive
//! - **Generators**: Proptest strategies for record ids and record sets
//! - **Fixtures**: Temporary export directories and ledgers kept in step with them
//!
//! ## Golden Vectors
//!
//! ```rust
//! use cvr_integrity_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cvr_integrity_testkit::fixtures::{random_record_id, ExportSession};
//!
//! let mut session = ExportSession::new().unwrap();
//! session.export(&random_record_id(), b"{}").unwrap();
//! assert_eq!(session.ledger.root_hash().unwrap().len(), 64);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{random_record_id, ExportFixture, ExportSession, REPORT_FILE_NAME};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, GoldenVector};
