//! Typed child lookups for the hash tree table.
//!
//! Every query that gathers a node's children is one of three fixed shapes.
//! Each variant carries its own SQL and its own bound parameters, so neither
//! prefixes nor comparison operators are ever spliced into SQL text.

use cvr_integrity_core::{Level1Prefix, Level2Prefix, NodeKey};

use crate::error::{Result, StoreError};

/// Selects the direct children of one tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSelector {
    /// Leaves under a level-2 aggregate.
    LeavesOf(Level2Prefix),
    /// Level-2 aggregates under a level-1 aggregate.
    Level2sOf(Level1Prefix),
    /// Level-1 aggregates under the root.
    Level1s,
}

impl ChildSelector {
    /// The selector for the children of `parent`, `None` for a leaf.
    pub fn children_of(parent: &NodeKey) -> Option<Self> {
        match parent {
            NodeKey::Root => Some(ChildSelector::Level1s),
            NodeKey::Level1(p) => Some(ChildSelector::Level2sOf(*p)),
            NodeKey::Level2(p) => Some(ChildSelector::LeavesOf(*p)),
            NodeKey::Leaf(_) => None,
        }
    }

    /// Like [`Self::children_of`], but a leaf parent is an error.
    pub fn for_parent(parent: &NodeKey) -> Result<Self> {
        Self::children_of(parent).ok_or_else(|| {
            StoreError::InvalidData(format!("{:?} cannot have children", parent))
        })
    }

    /// The complete SELECT statement for this child set.
    pub fn sql(&self) -> &'static str {
        match self {
            ChildSelector::LeavesOf(_) => {
                "SELECT cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id, cvr_hash
                 FROM cvr_hashes
                 WHERE cvr_id_level_1_prefix = ?1
                   AND cvr_id_level_2_prefix = ?2
                   AND cvr_id != ''"
            }
            ChildSelector::Level2sOf(_) => {
                "SELECT cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id, cvr_hash
                 FROM cvr_hashes
                 WHERE cvr_id_level_1_prefix = ?1
                   AND cvr_id_level_2_prefix != ''
                   AND cvr_id = ''"
            }
            ChildSelector::Level1s => {
                "SELECT cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id, cvr_hash
                 FROM cvr_hashes
                 WHERE cvr_id_level_1_prefix != ''
                   AND cvr_id_level_2_prefix = ''
                   AND cvr_id = ''"
            }
        }
    }

    /// Positional parameters matching the placeholders in [`Self::sql`].
    pub fn params(&self) -> Vec<String> {
        match self {
            ChildSelector::LeavesOf(p) => vec![p.level1().to_string(), p.to_string()],
            ChildSelector::Level2sOf(p) => vec![p.to_string()],
            ChildSelector::Level1s => Vec::new(),
        }
    }

    /// Whether `key` belongs to this child set.
    pub fn matches(&self, key: &NodeKey) -> bool {
        match (self, key) {
            (ChildSelector::LeavesOf(p), NodeKey::Leaf(id)) => id.level2_prefix() == *p,
            (ChildSelector::Level2sOf(p), NodeKey::Level2(l2)) => l2.level1() == *p,
            (ChildSelector::Level1s, NodeKey::Level1(_)) => true,
            _ => false,
        }
    }
}
