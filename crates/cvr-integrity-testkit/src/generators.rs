//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use cvr_integrity_core::{CastVoteRecordId, Sha256Hash};

/// Generate a lowercase UUID-shaped record id.
pub fn cvr_id() -> impl Strategy<Value = CastVoteRecordId> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
        .prop_map(|s| CastVoteRecordId::new(s).expect("pattern yields 36 characters"))
}

/// Generate ids from a narrow alphabet so that level-1 and level-2 prefixes
/// are shared between records.
pub fn colliding_cvr_id() -> impl Strategy<Value = CastVoteRecordId> {
    "[ab][ab0][0-9a-f]{6}-0000-0000-0000-[0-9a-f]{12}"
        .prop_map(|s| CastVoteRecordId::new(s).expect("pattern yields 36 characters"))
}

/// Generate a random SHA-256 digest.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash::from_bytes)
}

/// Generate report contents of specified max length.
pub fn report_contents(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a set of exported records, unique by id.
pub fn record_set(max_records: usize) -> impl Strategy<Value = BTreeMap<CastVoteRecordId, Vec<u8>>> {
    prop::collection::btree_map(colliding_cvr_id(), report_contents(64), 0..=max_records)
}

/// Generate a record set together with a permutation of its ids, for
/// feeding the same records in a different order.
pub fn record_set_with_order(
    max_records: usize,
) -> impl Strategy<Value = (BTreeMap<CastVoteRecordId, Vec<u8>>, Vec<CastVoteRecordId>)> {
    record_set(max_records).prop_flat_map(|records| {
        let ids: Vec<CastVoteRecordId> = records.keys().cloned().collect();
        (Just(records), Just(ids).prop_shuffle())
    })
}
