//! The three-level aggregation tree over leaf digests.
//!
//! ```text
//!                     Root
//!          ┌───────────┼───────────┐
//!      Level1(a)   Level1(c)   Level1(e)       keyed by id[0..1]
//!      ┌───┴───┐       │           │
//!  Level2(a1) Level2(ab) ...        ...        keyed by id[0..2]
//!      │     ┌───┼───┐
//!    Leaf  Leaf Leaf Leaf                      keyed by full id
//! ```
//!
//! Each parent is [`compute_combined_hash`] over its children, with the
//! child's own key as the sort key. Only groups with at least one leaf exist.

use std::collections::BTreeMap;

use crate::crypto::{compute_combined_hash, CombinableHash, Sha256Hash};
use crate::error::{CoreError, Result};
use crate::types::{CastVoteRecordId, Level1Prefix, Level2Prefix};

/// Identifies one node of the aggregation tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Root,
    Level1(Level1Prefix),
    Level2(Level2Prefix),
    Leaf(CastVoteRecordId),
}

impl NodeKey {
    /// The key under which this node is sorted among its siblings.
    ///
    /// The root has no siblings and sorts under the empty string.
    pub fn sort_key(&self) -> String {
        match self {
            NodeKey::Root => String::new(),
            NodeKey::Level1(p) => p.to_string(),
            NodeKey::Level2(p) => p.to_string(),
            NodeKey::Leaf(id) => id.to_string(),
        }
    }

    /// The parent of this node, `None` for the root.
    pub fn parent(&self) -> Option<NodeKey> {
        match self {
            NodeKey::Root => None,
            NodeKey::Level1(_) => Some(NodeKey::Root),
            NodeKey::Level2(p) => Some(NodeKey::Level1(p.level1())),
            NodeKey::Leaf(id) => Some(NodeKey::Level2(id.level2_prefix())),
        }
    }

    /// Flatten into `(level1_prefix, level2_prefix, cvr_id)` columns, using
    /// the empty string for levels the node does not have.
    pub fn to_columns(&self) -> (String, String, String) {
        match self {
            NodeKey::Root => (String::new(), String::new(), String::new()),
            NodeKey::Level1(p) => (p.to_string(), String::new(), String::new()),
            NodeKey::Level2(p) => (p.level1().to_string(), p.to_string(), String::new()),
            NodeKey::Leaf(id) => (
                id.level1_prefix().to_string(),
                id.level2_prefix().to_string(),
                id.to_string(),
            ),
        }
    }

    /// Rebuild a key from its flattened columns.
    ///
    /// Rejects any combination that is not exactly one of the four node
    /// shapes, including prefixes that disagree with each other.
    pub fn from_columns(level1: &str, level2: &str, cvr_id: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidNodeKey {
            level1: level1.to_owned(),
            level2: level2.to_owned(),
            cvr_id: cvr_id.to_owned(),
        };

        match (level1.is_empty(), level2.is_empty(), cvr_id.is_empty()) {
            (true, true, true) => Ok(NodeKey::Root),
            (false, true, true) => Level1Prefix::parse(level1)
                .map(NodeKey::Level1)
                .ok_or_else(invalid),
            (false, false, true) => {
                let l1 = Level1Prefix::parse(level1).ok_or_else(invalid)?;
                let l2 = Level2Prefix::parse(level2).ok_or_else(invalid)?;
                if l2.level1() != l1 {
                    return Err(invalid());
                }
                Ok(NodeKey::Level2(l2))
            }
            (false, false, false) => {
                let id = CastVoteRecordId::new(cvr_id).map_err(|_| invalid())?;
                if id.level1_prefix().to_string() != level1
                    || id.level2_prefix().to_string() != level2
                {
                    return Err(invalid());
                }
                Ok(NodeKey::Leaf(id))
            }
            _ => Err(invalid()),
        }
    }
}

/// A fully materialized aggregation tree, built in one pass from its leaves.
///
/// This is the reference computation: any incrementally maintained tree over
/// the same leaves must hold exactly the same nodes and digests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashTree {
    nodes: BTreeMap<NodeKey, Sha256Hash>,
}

impl HashTree {
    /// Build the tree over `(id, leaf digest)` pairs.
    ///
    /// If an id appears more than once, the last digest wins, matching the
    /// upsert semantics of the incremental stores.
    pub fn from_leaves<I>(leaves: I) -> Self
    where
        I: IntoIterator<Item = (CastVoteRecordId, Sha256Hash)>,
    {
        let leaves: BTreeMap<CastVoteRecordId, Sha256Hash> = leaves.into_iter().collect();
        let mut nodes = BTreeMap::new();
        if leaves.is_empty() {
            return Self { nodes };
        }

        let mut level2_groups: BTreeMap<Level2Prefix, Vec<CombinableHash>> = BTreeMap::new();
        for (id, hash) in &leaves {
            level2_groups
                .entry(id.level2_prefix())
                .or_default()
                .push(CombinableHash::new(*hash, id.as_str()));
        }

        let mut level1_groups: BTreeMap<Level1Prefix, Vec<CombinableHash>> = BTreeMap::new();
        for (prefix, children) in level2_groups {
            let hash = compute_combined_hash(children);
            level1_groups
                .entry(prefix.level1())
                .or_default()
                .push(CombinableHash::new(hash, prefix.to_string()));
            nodes.insert(NodeKey::Level2(prefix), hash);
        }

        let mut root_children = Vec::with_capacity(level1_groups.len());
        for (prefix, children) in level1_groups {
            let hash = compute_combined_hash(children);
            root_children.push(CombinableHash::new(hash, prefix.to_string()));
            nodes.insert(NodeKey::Level1(prefix), hash);
        }

        nodes.insert(NodeKey::Root, compute_combined_hash(root_children));
        for (id, hash) in leaves {
            nodes.insert(NodeKey::Leaf(id), hash);
        }

        Self { nodes }
    }

    /// The root digest, `None` when the tree has no leaves.
    pub fn root(&self) -> Option<Sha256Hash> {
        self.get(&NodeKey::Root)
    }

    pub fn get(&self, key: &NodeKey) -> Option<Sha256Hash> {
        self.nodes.get(key).copied()
    }

    /// All nodes in key order: root, level-1, level-2, then leaves.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &Sha256Hash)> {
        self.nodes.iter()
    }

    /// Total number of nodes, aggregates included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .keys()
            .filter(|k| matches!(k, NodeKey::Leaf(_)))
            .count()
    }
}
