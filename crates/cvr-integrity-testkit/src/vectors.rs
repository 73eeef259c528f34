//! Golden test vectors for deterministic verification.
//!
//! Each vector lists exported records and the root every implementation must
//! derive from them. Vectors serialize to JSON so other tools can consume the
//! same fixtures.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use cvr_integrity_core::{
    compute_cast_vote_record_directory_hash, CastVoteRecordId, FileFromData, HashTree,
    HashableFile,
};
use cvr_integrity_store::{HashStore, MemoryHashStore};

use crate::fixtures::REPORT_FILE_NAME;

/// One file inside an exported record directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenFile {
    pub name: String,
    pub contents: String,
}

/// One exported record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenRecord {
    pub cvr_id: String,
    pub files: Vec<GoldenFile>,
    /// Expected leaf digest (hex), when pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_leaf: Option<String>,
}

/// A golden test vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: String,
    pub records: Vec<GoldenRecord>,
    /// Expected root digest (hex), `""` for no records.
    pub expected_root: String,
}

fn record_id(prefix: &str) -> String {
    format!("{}-0000-0000-0000-000000000000", prefix)
}

fn report_only(prefix: &str, contents: &str, expected_leaf: Option<&str>) -> GoldenRecord {
    GoldenRecord {
        cvr_id: record_id(prefix),
        files: vec![GoldenFile {
            name: REPORT_FILE_NAME.to_owned(),
            contents: contents.to_owned(),
        }],
        expected_leaf: expected_leaf.map(str::to_owned),
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "no records".to_owned(),
            records: Vec::new(),
            expected_root: String::new(),
        },
        GoldenVector {
            name: "single record".to_owned(),
            records: vec![report_only(
                "a1234567",
                "a",
                Some("91317fb7b2d97ef2610a563535f4b5676315cc7ecea3e6a9c5ae5ba74f81beff"),
            )],
            expected_root: "70aa4673470717dd808c4731c2d2bf721d553bb77942abd91fb0aa98396dee0d"
                .to_owned(),
        },
        GoldenVector {
            name: "seven records across shared prefixes".to_owned(),
            records: ["a1234567", "a2345678", "ab123456", "ab234567", "ab345678", "c1234567", "e1234567"]
                .iter()
                .zip(["a", "b", "c", "d", "e", "f", "g"])
                .map(|(prefix, contents)| report_only(prefix, contents, None))
                .collect(),
            expected_root: "9ae397df2e7f47e7a4dd004f3a45821a2a5c348e501576032f6d7bf16cebeb63"
                .to_owned(),
        },
        GoldenVector {
            name: "record with ballot image".to_owned(),
            records: vec![
                report_only("a1234567", "a", None),
                GoldenRecord {
                    cvr_id: record_id("b1234567"),
                    files: vec![
                        GoldenFile {
                            name: REPORT_FILE_NAME.to_owned(),
                            contents: "report".to_owned(),
                        },
                        GoldenFile {
                            name: "front.jpg".to_owned(),
                            contents: "front".to_owned(),
                        },
                    ],
                    expected_leaf: Some(
                        "36822bbcd0b984be5f3f38cc9f6cd4ad77f6f3fdcfc58213c4c5dca5b1ffe799"
                            .to_owned(),
                    ),
                },
            ],
            expected_root: "806eb54c0f33fa7567132eaafc5a86036e378abb9952e97015c01018eef375b1"
                .to_owned(),
        },
    ]
}

/// Serialize vectors for consumption by other implementations.
pub fn vectors_to_json(vectors: &[GoldenVector]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(vectors)?)
}

pub fn vectors_from_json(json: &str) -> anyhow::Result<Vec<GoldenVector>> {
    serde_json::from_str(json).context("parsing golden vectors")
}

/// Check one vector against the one-pass tree and an incremental store.
pub fn verify_vector(vector: &GoldenVector) -> anyhow::Result<()> {
    let mut leaves = Vec::with_capacity(vector.records.len());
    for record in &vector.records {
        let cvr_id = CastVoteRecordId::new(record.cvr_id.as_str())?;
        let files: Vec<FileFromData> = record
            .files
            .iter()
            .map(|f| FileFromData::new(f.name.as_str(), f.contents.clone()))
            .collect();
        let refs: Vec<&dyn HashableFile> = files.iter().map(|f| f as &dyn HashableFile).collect();

        let leaf = compute_cast_vote_record_directory_hash(&cvr_id, &refs)?;
        if let Some(expected) = &record.expected_leaf {
            if leaf.to_hex() != *expected {
                bail!(
                    "{}: leaf for {} is {}, expected {}",
                    vector.name,
                    cvr_id,
                    leaf,
                    expected
                );
            }
        }
        leaves.push((cvr_id, leaf));
    }

    let mut store = MemoryHashStore::new();
    for (cvr_id, leaf) in &leaves {
        store.update_cast_vote_record_hashes(cvr_id, *leaf)?;
    }
    let incremental = store.get_cast_vote_record_root_hash()?;
    let one_pass = HashTree::from_leaves(leaves)
        .root()
        .map(|h| h.to_hex())
        .unwrap_or_default();

    if incremental != one_pass {
        bail!(
            "{}: incremental root {} differs from one-pass root {}",
            vector.name,
            incremental,
            one_pass
        );
    }
    if one_pass != vector.expected_root {
        bail!(
            "{}: root is {}, expected {}",
            vector.name,
            one_pass,
            vector.expected_root
        );
    }
    Ok(())
}

/// Verify all golden vectors.
pub fn verify_all_vectors() -> anyhow::Result<()> {
    for vector in all_vectors() {
        verify_vector(&vector)?;
    }
    Ok(())
}
