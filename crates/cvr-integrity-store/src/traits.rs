//! HashStore trait: the interface for an incrementally maintained hash tree.
//!
//! Implementations include SQLite (primary) and in-memory (for tests). Both
//! must hold exactly the nodes that [`HashTree::from_leaves`] would build
//! over the same leaves.
//!
//! [`HashTree::from_leaves`]: cvr_integrity_core::HashTree::from_leaves

use cvr_integrity_core::{CastVoteRecordId, HashTree, NodeKey, Sha256Hash};

use crate::error::Result;

/// The incremental hash store.
///
/// Mutating methods take `&mut self`: whoever holds the handle mutably is the
/// single writer for the export session.
///
/// # Design Notes
///
/// - **Idempotent updates**: Updating an id with the digest it already has
///   leaves every node unchanged.
/// - **Overwrites**: Updating an id with a different digest replaces its leaf.
/// - **Atomicity**: A failed update or replace leaves the tree exactly as it
///   was before.
/// - **Empty state**: No leaves means no root; see
///   [`get_cast_vote_record_root_hash`](HashStore::get_cast_vote_record_root_hash).
pub trait HashStore: Send {
    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the digest stored for one node.
    fn node_hash(&self, key: &NodeKey) -> Result<Option<Sha256Hash>>;

    /// Get every stored node, in [`NodeKey`] order.
    fn nodes(&self) -> Result<Vec<(NodeKey, Sha256Hash)>>;

    /// Count of leaf nodes.
    fn leaf_count(&self) -> Result<usize>;

    /// Get the root digest, `None` when no record has been added.
    fn root_hash(&self) -> Result<Option<Sha256Hash>> {
        self.node_hash(&NodeKey::Root)
    }

    /// Get the root digest as lowercase hex, or `""` when no record has been
    /// added. The empty string is the "no records" sentinel, not the digest
    /// of an empty input.
    fn get_cast_vote_record_root_hash(&self) -> Result<String> {
        Ok(self.root_hash()?.map(|h| h.to_hex()).unwrap_or_default())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Updates
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace a leaf and recompute its level-2 aggregate, its
    /// level-1 aggregate and the root, atomically.
    fn update_cast_vote_record_hashes(
        &mut self,
        cvr_id: &CastVoteRecordId,
        leaf_hash: Sha256Hash,
    ) -> Result<()>;

    /// Delete every node.
    fn clear_cast_vote_record_hashes(&mut self) -> Result<()>;

    /// Replace every node with those of `tree`, atomically. On failure the
    /// previous tree is left in place.
    fn replace_cast_vote_record_hashes(&mut self, tree: &HashTree) -> Result<()>;
}
