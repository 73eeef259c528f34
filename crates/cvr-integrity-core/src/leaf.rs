//! Leaf digests for exported cast vote record directories.
//!
//! A leaf digest covers a record's file contents *and* their location. The
//! record directory is summarized in checksum-listing form, one line per file:
//!
//! ```text
//! {hex(sha256(contents))}  {cvr_id}/{file_name}\n
//! ```
//!
//! Lines are ordered by file name and the leaf digest is the SHA-256 of the
//! concatenated summary. Moving or renaming a file changes its line and so the
//! leaf digest, even when the bytes are untouched.

use std::path::is_separator;

use crate::crypto::Sha256Hash;
use crate::error::{CoreError, Result};
use crate::file::HashableFile;
use crate::types::CastVoteRecordId;

/// Compute the leaf digest of a record exported as a single report file.
pub fn compute_single_cast_vote_record_hash<F>(
    cvr_id: &CastVoteRecordId,
    report_file: &F,
) -> Result<Sha256Hash>
where
    F: HashableFile + ?Sized,
{
    validate_file_name(report_file.file_name())?;
    let summary = summary_line(cvr_id, report_file.file_name(), report_file.compute_sha256_hash()?);
    Ok(Sha256Hash::hash(summary.as_bytes()))
}

/// Compute the leaf digest of a record exported as several files.
///
/// With one file this equals [`compute_single_cast_vote_record_hash`].
pub fn compute_cast_vote_record_directory_hash(
    cvr_id: &CastVoteRecordId,
    files: &[&dyn HashableFile],
) -> Result<Sha256Hash> {
    let summary = directory_summary(cvr_id, files)?;
    Ok(Sha256Hash::hash(summary.as_bytes()))
}

/// Build the checksum-listing summary of a record directory.
pub fn directory_summary(cvr_id: &CastVoteRecordId, files: &[&dyn HashableFile]) -> Result<String> {
    let mut ordered: Vec<&dyn HashableFile> = files.to_vec();
    ordered.sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for pair in ordered.windows(2) {
        if pair[0].file_name() == pair[1].file_name() {
            return Err(CoreError::InvalidFileName {
                name: pair[0].file_name().to_owned(),
                reason: "appears more than once in the record directory",
            });
        }
    }

    let mut summary = String::new();
    for file in ordered {
        validate_file_name(file.file_name())?;
        summary.push_str(&summary_line(cvr_id, file.file_name(), file.compute_sha256_hash()?));
    }
    Ok(summary)
}

fn summary_line(cvr_id: &CastVoteRecordId, file_name: &str, content_hash: Sha256Hash) -> String {
    format!("{}  {}/{}\n", content_hash.to_hex(), cvr_id, file_name)
}

fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidFileName {
            name: name.to_owned(),
            reason: "must not be empty",
        });
    }
    if name.chars().any(|c| is_separator(c) || c == '\n') {
        return Err(CoreError::InvalidFileName {
            name: name.to_owned(),
            reason: "must not contain a path separator or newline",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileFromData;

    const REPORT: &str = "cast-vote-record-report.json";

    fn id(s: &str) -> CastVoteRecordId {
        CastVoteRecordId::new(s).unwrap()
    }

    #[test]
    fn test_single_report_known_value() {
        let cvr_id = id("a1234567-0000-0000-0000-000000000000");
        let file = FileFromData::new(REPORT, "a");
        let leaf = compute_single_cast_vote_record_hash(&cvr_id, &file).unwrap();
        assert_eq!(
            leaf.to_hex(),
            "91317fb7b2d97ef2610a563535f4b5676315cc7ecea3e6a9c5ae5ba74f81beff"
        );
    }

    #[test]
    fn test_summary_format() {
        let cvr_id = id("a1234567-0000-0000-0000-000000000000");
        let file = FileFromData::new(REPORT, "a");
        let summary = directory_summary(&cvr_id, &[&file]).unwrap();
        assert_eq!(
            summary,
            format!(
                "{}  a1234567-0000-0000-0000-000000000000/{}\n",
                Sha256Hash::hash(b"a").to_hex(),
                REPORT
            )
        );
    }

    #[test]
    fn test_directory_hash_orders_by_file_name() {
        let cvr_id = id("b1234567-0000-0000-0000-000000000000");
        let report = FileFromData::new(REPORT, "report");
        let image = FileFromData::new("front.jpg", "front");

        let forward = compute_cast_vote_record_directory_hash(&cvr_id, &[&report, &image]).unwrap();
        let backward = compute_cast_vote_record_directory_hash(&cvr_id, &[&image, &report]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(
            forward.to_hex(),
            "36822bbcd0b984be5f3f38cc9f6cd4ad77f6f3fdcfc58213c4c5dca5b1ffe799"
        );
    }

    #[test]
    fn test_single_file_directory_equals_single_report() {
        let cvr_id = id("b1234567-0000-0000-0000-000000000000");
        let report = FileFromData::new(REPORT, "report");
        assert_eq!(
            compute_cast_vote_record_directory_hash(&cvr_id, &[&report]).unwrap(),
            compute_single_cast_vote_record_hash(&cvr_id, &report).unwrap()
        );
        assert_eq!(
            compute_single_cast_vote_record_hash(&cvr_id, &report).unwrap().to_hex(),
            "6a54051bd458d0c96bcda8a2c9f88abc9f3004b4c4a82837fcb77c2ef3c427e5"
        );
    }

    #[test]
    fn test_leaf_depends_on_location() {
        let file = FileFromData::new(REPORT, "same bytes");
        let renamed = FileFromData::new("other.json", "same bytes");
        let a = id("a1234567-0000-0000-0000-000000000000");
        let b = id("b1234567-0000-0000-0000-000000000000");

        let base = compute_single_cast_vote_record_hash(&a, &file).unwrap();
        assert_ne!(base, compute_single_cast_vote_record_hash(&b, &file).unwrap());
        assert_ne!(base, compute_single_cast_vote_record_hash(&a, &renamed).unwrap());
    }

    #[test]
    fn test_duplicate_and_bad_file_names_rejected() {
        let cvr_id = id("a1234567-0000-0000-0000-000000000000");
        let one = FileFromData::new(REPORT, "1");
        let two = FileFromData::new(REPORT, "2");
        assert!(matches!(
            compute_cast_vote_record_directory_hash(&cvr_id, &[&one, &two]),
            Err(CoreError::InvalidFileName { .. })
        ));

        let nested = FileFromData::new("images/front.jpg", "x");
        assert!(compute_cast_vote_record_directory_hash(&cvr_id, &[&nested]).is_err());
    }
}
