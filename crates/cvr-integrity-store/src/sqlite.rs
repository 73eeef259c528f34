//! SQLite implementation of the HashStore trait.
//!
//! This is the primary storage backend. It owns a single rusqlite connection
//! (bundled SQLite); every update runs in one IMMEDIATE transaction, so other
//! connections to the same database only ever see a complete tree.

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

use cvr_integrity_core::{
    compute_combined_hash, CastVoteRecordId, CombinableHash, HashTree, NodeKey, Sha256Hash,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::selector::ChildSelector;
use crate::traits::HashStore;

/// SQLite-based hash store.
pub struct SqliteHashStore {
    conn: Connection,
}

impl SqliteHashStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Take over an existing connection, migrating its schema first.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn)?;
        Ok(Self { conn })
    }
}

/// Insert a node or replace its digest.
fn upsert_node(conn: &Connection, key: &NodeKey, hash: &Sha256Hash) -> Result<()> {
    let (level1, level2, cvr_id) = key.to_columns();
    conn.execute(
        "INSERT INTO cvr_hashes (cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id, cvr_hash)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id)
         DO UPDATE SET cvr_hash = excluded.cvr_hash",
        params![level1, level2, cvr_id, hash.to_hex()],
    )?;
    Ok(())
}

/// Load the direct children of a node as combinable entries.
fn select_children(conn: &Connection, selector: ChildSelector) -> Result<Vec<CombinableHash>> {
    let mut stmt = conn.prepare_cached(selector.sql())?;
    let rows = stmt
        .query_map(params_from_iter(selector.params()), read_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|row| {
            let (key, hash) = parse_row(row)?;
            if !selector.matches(&key) {
                return Err(StoreError::InvalidData(format!(
                    "{:?} returned by {:?}",
                    key, selector
                )));
            }
            Ok(CombinableHash::new(hash, key.sort_key()))
        })
        .collect()
}

type RawRow = (String, String, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn parse_row((level1, level2, cvr_id, hash): RawRow) -> Result<(NodeKey, Sha256Hash)> {
    let key = NodeKey::from_columns(&level1, &level2, &cvr_id)?;
    let hash = Sha256Hash::from_hex(&hash)?;
    Ok((key, hash))
}

/// Upsert a leaf, then recompute its level-2, level-1 and root aggregates.
///
/// Callers own the transaction.
fn write_leaf_path(
    conn: &Connection,
    cvr_id: &CastVoteRecordId,
    leaf_hash: Sha256Hash,
) -> Result<()> {
    let mut node = NodeKey::Leaf(cvr_id.clone());
    upsert_node(conn, &node, &leaf_hash)?;
    tracing::trace!(cvr_id = %cvr_id, leaf = %leaf_hash, "upserted leaf");

    while let Some(parent) = node.parent() {
        let children = select_children(conn, ChildSelector::for_parent(&parent)?)?;
        let hash = compute_combined_hash(children);
        upsert_node(conn, &parent, &hash)?;
        tracing::trace!(node = ?parent, hash = %hash, "recomputed aggregate");
        node = parent;
    }
    Ok(())
}

impl HashStore for SqliteHashStore {
    fn node_hash(&self, key: &NodeKey) -> Result<Option<Sha256Hash>> {
        let (level1, level2, cvr_id) = key.to_columns();
        let hex: Option<String> = self
            .conn
            .query_row(
                "SELECT cvr_hash FROM cvr_hashes
                 WHERE cvr_id_level_1_prefix = ?1
                   AND cvr_id_level_2_prefix = ?2
                   AND cvr_id = ?3",
                params![level1, level2, cvr_id],
                |row| row.get(0),
            )
            .optional()?;

        hex.map(|h| Sha256Hash::from_hex(&h).map_err(StoreError::from))
            .transpose()
    }

    fn nodes(&self) -> Result<Vec<(NodeKey, Sha256Hash)>> {
        let mut stmt = self.conn.prepare(
            "SELECT cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id, cvr_hash
             FROM cvr_hashes",
        )?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut nodes = rows
            .into_iter()
            .map(parse_row)
            .collect::<Result<Vec<_>>>()?;
        nodes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(nodes)
    }

    fn leaf_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cvr_hashes WHERE cvr_id != ''",
            [],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("leaf count {}", count)))
    }

    fn update_cast_vote_record_hashes(
        &mut self,
        cvr_id: &CastVoteRecordId,
        leaf_hash: Sha256Hash,
    ) -> Result<()> {
        // Dropping the transaction on any early return rolls it back.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_leaf_path(&tx, cvr_id, leaf_hash)?;
        tx.commit()?;

        tracing::debug!(cvr_id = %cvr_id, "updated cast vote record hashes");
        Ok(())
    }

    fn clear_cast_vote_record_hashes(&mut self) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM cvr_hashes", [])?;
        tracing::debug!(deleted, "cleared cast vote record hashes");
        Ok(())
    }

    fn replace_cast_vote_record_hashes(&mut self, tree: &HashTree) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM cvr_hashes", [])?;
        for (key, hash) in tree.iter() {
            upsert_node(&tx, key, hash)?;
        }
        tx.commit()?;

        tracing::debug!(nodes = tree.len(), "replaced cast vote record hashes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvr_integrity_core::{
        compute_single_cast_vote_record_hash, FileFromData, Level1Prefix, Level2Prefix,
    };

    fn id(prefix: &str) -> CastVoteRecordId {
        CastVoteRecordId::new(format!("{}-0000-0000-0000-000000000000", prefix)).unwrap()
    }

    fn leaf_for(cvr_id: &CastVoteRecordId, contents: &str) -> Sha256Hash {
        let report = FileFromData::new("cast-vote-record-report.json", contents.to_owned());
        compute_single_cast_vote_record_hash(cvr_id, &report).unwrap()
    }

    fn reference_scenario() -> Vec<(CastVoteRecordId, Sha256Hash)> {
        ["a1234567", "a2345678", "ab123456", "ab234567", "ab345678", "c1234567", "e1234567"]
            .iter()
            .zip(["a", "b", "c", "d", "e", "f", "g"])
            .map(|(prefix, contents)| {
                let cvr_id = id(prefix);
                let leaf = leaf_for(&cvr_id, contents);
                (cvr_id, leaf)
            })
            .collect()
    }

    #[test]
    fn test_empty_store_has_empty_root() {
        let store = SqliteHashStore::open_memory().unwrap();
        assert_eq!(store.get_cast_vote_record_root_hash().unwrap(), "");
        assert_eq!(store.root_hash().unwrap(), None);
        assert_eq!(store.leaf_count().unwrap(), 0);
    }

    #[test]
    fn test_single_update_nests_hashes() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        store
            .update_cast_vote_record_hashes(&id("abcd1234"), Sha256Hash::empty())
            .unwrap();

        let mut expected = Sha256Hash::empty();
        for _ in 0..3 {
            expected = Sha256Hash::hash(expected.to_hex().as_bytes());
        }
        assert_eq!(store.get_cast_vote_record_root_hash().unwrap(), expected.to_hex());
        assert_eq!(store.nodes().unwrap().len(), 4);
    }

    #[test]
    fn test_reference_scenario_root() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        for (cvr_id, leaf) in reference_scenario() {
            store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        }
        assert_eq!(
            store.get_cast_vote_record_root_hash().unwrap(),
            "9ae397df2e7f47e7a4dd004f3a45821a2a5c348e501576032f6d7bf16cebeb63"
        );
    }

    #[test]
    fn test_matches_reference_tree_node_for_node() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        let leaves = reference_scenario();
        for (cvr_id, leaf) in leaves.iter().rev() {
            store.update_cast_vote_record_hashes(cvr_id, *leaf).unwrap();
        }

        let tree = HashTree::from_leaves(leaves);
        let expected: Vec<(NodeKey, Sha256Hash)> =
            tree.iter().map(|(k, h)| (k.clone(), *h)).collect();
        assert_eq!(store.nodes().unwrap(), expected);
        assert_eq!(store.leaf_count().unwrap(), 7);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        let cvr_id = id("a1234567");
        let leaf = leaf_for(&cvr_id, "a");

        store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        let first = store.nodes().unwrap();
        store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        assert_eq!(store.nodes().unwrap(), first);
    }

    #[test]
    fn test_update_overwrites_leaf() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        let cvr_id = id("a1234567");

        store
            .update_cast_vote_record_hashes(&cvr_id, leaf_for(&cvr_id, "old"))
            .unwrap();
        let corrected = leaf_for(&cvr_id, "new");
        store.update_cast_vote_record_hashes(&cvr_id, corrected).unwrap();

        assert_eq!(store.leaf_count().unwrap(), 1);
        assert_eq!(
            store.node_hash(&NodeKey::Leaf(cvr_id.clone())).unwrap(),
            Some(corrected)
        );
        assert_eq!(
            store.root_hash().unwrap(),
            HashTree::from_leaves([(cvr_id, corrected)]).root()
        );
    }

    #[test]
    fn test_clear_resets_root() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        for (cvr_id, leaf) in reference_scenario() {
            store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        }
        store.clear_cast_vote_record_hashes().unwrap();

        assert_eq!(store.get_cast_vote_record_root_hash().unwrap(), "");
        assert!(store.nodes().unwrap().is_empty());
    }

    #[test]
    fn test_leaf_change_only_touches_its_path() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        for (cvr_id, leaf) in reference_scenario() {
            store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        }
        let before = store.nodes().unwrap();

        let changed = id("ab234567");
        store
            .update_cast_vote_record_hashes(&changed, leaf_for(&changed, "tampered"))
            .unwrap();
        let after = store.nodes().unwrap();

        let path = [
            NodeKey::Root,
            NodeKey::Level1(Level1Prefix::new('a')),
            NodeKey::Level2(Level2Prefix::new('a', 'b')),
            NodeKey::Leaf(changed),
        ];
        assert_eq!(before.len(), after.len());
        for ((key_before, hash_before), (key_after, hash_after)) in before.iter().zip(&after) {
            assert_eq!(key_before, key_after);
            if path.contains(key_before) {
                assert_ne!(hash_before, hash_after, "{:?} should change", key_before);
            } else {
                assert_eq!(hash_before, hash_after, "{:?} should not change", key_before);
            }
        }
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        let first = id("a1234567");
        store
            .update_cast_vote_record_hashes(&first, leaf_for(&first, "a"))
            .unwrap();
        let before = store.nodes().unwrap();

        // Make the final step (the root upsert) fail after the leaf and both
        // aggregates have already been written inside the transaction.
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER fail_root BEFORE INSERT ON cvr_hashes
                 WHEN NEW.cvr_id_level_1_prefix = ''
                 BEGIN SELECT RAISE(ABORT, 'root write refused'); END;",
            )
            .unwrap();

        let second = id("c1234567");
        let result = store.update_cast_vote_record_hashes(&second, leaf_for(&second, "c"));
        assert!(matches!(result, Err(StoreError::Database(_))));

        assert_eq!(store.nodes().unwrap(), before);
        assert_eq!(store.node_hash(&NodeKey::Leaf(second)).unwrap(), None);
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO cvr_hashes
                 VALUES ('a', 'ab', 'ab999999-0000-0000-0000-000000000000', ?1)",
                [&"z".repeat(64)],
            )
            .unwrap();
        assert!(store.nodes().is_err());

        let cvr_id = id("ab123456");
        let result = store.update_cast_vote_record_hashes(&cvr_id, leaf_for(&cvr_id, "x"));
        assert!(result.is_err());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.db");

        let root = {
            let mut store = SqliteHashStore::open(&path).unwrap();
            for (cvr_id, leaf) in reference_scenario() {
                store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
            }
            store.get_cast_vote_record_root_hash().unwrap()
        };

        let reopened = SqliteHashStore::open(&path).unwrap();
        assert_eq!(reopened.get_cast_vote_record_root_hash().unwrap(), root);
    }

    #[test]
    fn test_second_connection_sees_committed_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.db");

        let mut writer = SqliteHashStore::open(&path).unwrap();
        let reader = SqliteHashStore::open(&path).unwrap();

        let cvr_id = id("a1234567");
        writer
            .update_cast_vote_record_hashes(&cvr_id, leaf_for(&cvr_id, "a"))
            .unwrap();
        assert_eq!(
            reader.get_cast_vote_record_root_hash().unwrap(),
            writer.get_cast_vote_record_root_hash().unwrap()
        );
    }

    #[test]
    fn test_replace_swaps_whole_tree() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        for (cvr_id, leaf) in reference_scenario() {
            store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        }

        let survivors: Vec<_> = reference_scenario().into_iter().skip(3).collect();
        let tree = HashTree::from_leaves(survivors);
        store.replace_cast_vote_record_hashes(&tree).unwrap();

        let expected: Vec<(NodeKey, Sha256Hash)> =
            tree.iter().map(|(k, h)| (k.clone(), *h)).collect();
        assert_eq!(store.nodes().unwrap(), expected);
        assert_eq!(store.leaf_count().unwrap(), 4);
    }

    #[test]
    fn test_failed_replace_keeps_previous_tree() {
        let mut store = SqliteHashStore::open_memory().unwrap();
        for (cvr_id, leaf) in reference_scenario() {
            store.update_cast_vote_record_hashes(&cvr_id, leaf).unwrap();
        }
        let before = store.nodes().unwrap();

        // Refuse one leaf midway through the rewrite.
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER fail_leaf BEFORE INSERT ON cvr_hashes
                 WHEN NEW.cvr_id = 'c1234567-0000-0000-0000-000000000000'
                 BEGIN SELECT RAISE(ABORT, 'leaf write refused'); END;",
            )
            .unwrap();

        let tree = HashTree::from_leaves(reference_scenario().into_iter().skip(1));
        let result = store.replace_cast_vote_record_hashes(&tree);
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.nodes().unwrap(), before);
    }

    #[test]
    fn test_reader_never_sees_uncommitted_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.db");

        let mut writer = SqliteHashStore::open(&path).unwrap();
        let reader = SqliteHashStore::open(&path).unwrap();
        let first = id("a1234567");
        writer
            .update_cast_vote_record_hashes(&first, leaf_for(&first, "a"))
            .unwrap();
        let old_root = reader.get_cast_vote_record_root_hash().unwrap();

        let second = id("c1234567");
        let tx = writer
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        write_leaf_path(&tx, &second, leaf_for(&second, "c")).unwrap();

        // Leaf, level-2, level-1 and root are written but not committed.
        assert_eq!(reader.get_cast_vote_record_root_hash().unwrap(), old_root);
        assert_eq!(reader.node_hash(&NodeKey::Leaf(second.clone())).unwrap(), None);

        tx.commit().unwrap();
        let expected = HashTree::from_leaves([
            (first.clone(), leaf_for(&first, "a")),
            (second.clone(), leaf_for(&second, "c")),
        ]);
        assert_eq!(reader.root_hash().unwrap(), expected.root());
    }
}
