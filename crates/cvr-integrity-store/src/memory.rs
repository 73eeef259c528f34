//! In-memory implementation of the HashStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;

use cvr_integrity_core::{
    compute_combined_hash, CastVoteRecordId, CombinableHash, HashTree, NodeKey, Sha256Hash,
};

use crate::error::{Result, StoreError};
use crate::selector::ChildSelector;
use crate::traits::HashStore;

type Children = BTreeMap<NodeKey, BTreeMap<NodeKey, Sha256Hash>>;

/// In-memory hash store.
///
/// Nodes are grouped under their parent, so recomputing an aggregate only
/// touches that aggregate's own children. All data is lost when the store
/// is dropped.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    root: Option<Sha256Hash>,
    children: Children,
}

impl MemoryHashStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn set(
        root: &mut Option<Sha256Hash>,
        children: &mut Children,
        key: NodeKey,
        hash: Sha256Hash,
    ) {
        match key.parent() {
            None => *root = Some(hash),
            Some(parent) => {
                children.entry(parent).or_default().insert(key, hash);
            }
        }
    }

    fn combined_children(&self, parent: &NodeKey) -> Result<Vec<CombinableHash>> {
        let selector = ChildSelector::for_parent(parent)?;
        let Some(group) = self.children.get(parent) else {
            return Ok(Vec::new());
        };

        group
            .iter()
            .map(|(key, hash)| {
                if !selector.matches(key) {
                    return Err(StoreError::InvalidData(format!(
                        "{:?} stored under {:?}",
                        key, parent
                    )));
                }
                Ok(CombinableHash::new(*hash, key.sort_key()))
            })
            .collect()
    }
}

impl HashStore for MemoryHashStore {
    fn node_hash(&self, key: &NodeKey) -> Result<Option<Sha256Hash>> {
        Ok(match key.parent() {
            None => self.root,
            Some(parent) => self
                .children
                .get(&parent)
                .and_then(|group| group.get(key))
                .copied(),
        })
    }

    fn nodes(&self) -> Result<Vec<(NodeKey, Sha256Hash)>> {
        let mut nodes: Vec<_> = self
            .root
            .map(|hash| (NodeKey::Root, hash))
            .into_iter()
            .chain(
                self.children
                    .values()
                    .flat_map(|group| group.iter().map(|(key, hash)| (key.clone(), *hash))),
            )
            .collect();
        nodes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(nodes)
    }

    fn leaf_count(&self) -> Result<usize> {
        Ok(self
            .children
            .iter()
            .filter(|(parent, _)| matches!(parent, NodeKey::Level2(_)))
            .map(|(_, group)| group.len())
            .sum())
    }

    fn update_cast_vote_record_hashes(
        &mut self,
        cvr_id: &CastVoteRecordId,
        leaf_hash: Sha256Hash,
    ) -> Result<()> {
        // Compute every aggregate before touching the maps, so an error
        // leaves the store as it was.
        let mut staged = vec![(NodeKey::Leaf(cvr_id.clone()), leaf_hash)];
        let mut node = staged[0].0.clone();
        let mut current = leaf_hash;

        while let Some(parent) = node.parent() {
            let mut entries: Vec<_> = self
                .combined_children(&parent)?
                .into_iter()
                .filter(|entry| entry.sort_key != node.sort_key())
                .collect();
            entries.push(CombinableHash::new(current, node.sort_key()));
            current = compute_combined_hash(entries);
            staged.push((parent.clone(), current));
            node = parent;
        }

        for (key, hash) in staged {
            Self::set(&mut self.root, &mut self.children, key, hash);
        }

        tracing::debug!(cvr_id = %cvr_id, "updated cast vote record hashes");
        Ok(())
    }

    fn clear_cast_vote_record_hashes(&mut self) -> Result<()> {
        self.root = None;
        self.children.clear();
        Ok(())
    }

    fn replace_cast_vote_record_hashes(&mut self, tree: &HashTree) -> Result<()> {
        let mut root = None;
        let mut children = Children::new();
        for (key, hash) in tree.iter() {
            Self::set(&mut root, &mut children, key.clone(), *hash);
        }

        self.root = root;
        self.children = children;
        tracing::debug!(nodes = tree.len(), "replaced cast vote record hashes");
        Ok(())
    }
}
