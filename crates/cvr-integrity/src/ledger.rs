//! The integrity ledger: one handle for the export session.
//!
//! The exporter records each cast vote record as it is written, the root is
//! read back for export metadata, and an audit compares that root against a
//! from-scratch recomputation of what actually sits on disk.

use std::path::Path;

use cvr_integrity_core::{
    compute_cast_vote_record_directory_hash, CastVoteRecordId, HashableFile, Sha256Hash,
};
use cvr_integrity_store::HashStore;

use crate::config::IntegrityConfig;
use crate::error::Result;
use crate::listing::{RecordIdLister, SubdirectoryLister};
use crate::verifier::FromScratchVerifier;

/// Outcome of comparing the incremental root with a recomputed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Root held by the hash store.
    pub incremental_root: String,
    /// Root recomputed from the export directory.
    pub recomputed_root: String,
}

impl VerificationReport {
    pub fn is_consistent(&self) -> bool {
        self.incremental_root == self.recomputed_root
    }
}

/// Incremental hash store paired with a verifier for the same export layout.
///
/// # Design Notes
///
/// - **Single writer**: Recording takes `&mut self`. The session that owns
///   the ledger is the only writer to its store.
/// - **Read-only audits**: [`verify`](Self::verify) never writes to the store.
/// - **Empty state**: Roots are `""` when no record has been recorded.
pub struct IntegrityLedger<S: HashStore, L = SubdirectoryLister> {
    store: S,
    verifier: FromScratchVerifier<L>,
}

impl<S: HashStore> IntegrityLedger<S> {
    /// Create a ledger that lists records as subdirectories of the export.
    pub fn new(store: S, config: IntegrityConfig) -> Self {
        Self::with_verifier(store, FromScratchVerifier::new(SubdirectoryLister, config))
    }
}

impl<S: HashStore, L: RecordIdLister> IntegrityLedger<S, L> {
    pub fn with_verifier(store: S, verifier: FromScratchVerifier<L>) -> Self {
        Self { store, verifier }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &IntegrityConfig {
        self.verifier.config()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Hash the files exported for one record and fold them into the tree.
    ///
    /// Returns the record's leaf digest. Nothing is written if hashing fails.
    pub fn record_exported(
        &mut self,
        cvr_id: &CastVoteRecordId,
        files: &[&dyn HashableFile],
    ) -> Result<Sha256Hash> {
        let leaf = compute_cast_vote_record_directory_hash(cvr_id, files)?;
        self.record_leaf_hash(cvr_id, leaf)?;
        Ok(leaf)
    }

    /// Fold an already computed leaf digest into the tree.
    pub fn record_leaf_hash(&mut self, cvr_id: &CastVoteRecordId, leaf: Sha256Hash) -> Result<()> {
        self.store.update_cast_vote_record_hashes(cvr_id, leaf)?;
        Ok(())
    }

    /// Current root as lowercase hex, `""` when nothing has been recorded.
    pub fn root_hash(&self) -> Result<String> {
        Ok(self.store.get_cast_vote_record_root_hash()?)
    }

    /// Forget every recorded hash, ahead of a full re-export.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear_cast_vote_record_hashes()?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audit Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Compare the recorded root with one recomputed from the export on disk.
    pub async fn verify(&self, export_dir: impl AsRef<Path>) -> Result<VerificationReport> {
        let incremental_root = self.root_hash()?;
        let recomputed_root = self.verifier.compute_root_hash(export_dir.as_ref()).await?;

        let report = VerificationReport {
            incremental_root,
            recomputed_root,
        };
        tracing::debug!(consistent = report.is_consistent(), "verified export");
        Ok(report)
    }

    /// Replace the recorded tree with one derived from the export on disk.
    ///
    /// Every leaf is read before the store is touched and the swap is a single
    /// atomic replace, so neither an unreadable export nor a failing store
    /// leaves a partial tree behind. Returns the new root.
    pub async fn rebuild_from_export_directory(
        &mut self,
        export_dir: impl AsRef<Path>,
    ) -> Result<String> {
        let tree = self.verifier.compute_tree(export_dir.as_ref()).await?;
        self.store.replace_cast_vote_record_hashes(&tree)?;

        tracing::debug!(records = tree.leaf_count(), "rebuilt hashes from export");
        self.root_hash()
    }

    /// Whether an export needs to be re-synced with this ledger.
    ///
    /// `exported_root` is the root recorded in the export's metadata, or
    /// `None` when that metadata is missing or unreadable. A ledger with no
    /// records never requires a sync.
    pub fn requires_sync(&self, exported_root: Option<&str>) -> Result<bool> {
        if self.store.leaf_count()? == 0 {
            return Ok(false);
        }
        Ok(match exported_root {
            Some(root) => root != self.root_hash()?,
            None => true,
        })
    }
}
