//! Test fixtures and helpers.
//!
//! Export directories on a temporary filesystem, laid out the way an exporter
//! writes them: one subdirectory per record, named by its id.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::Rng;
use tempfile::TempDir;

use cvr_integrity::{IntegrityConfig, IntegrityLedger};
use cvr_integrity_core::{CastVoteRecordId, FileFromData, HashableFile, Sha256Hash};
use cvr_integrity_store::{HashStore, MemoryHashStore};

/// Report file name used by every fixture.
pub const REPORT_FILE_NAME: &str = cvr_integrity::DEFAULT_REPORT_FILE_NAME;

/// Generate a random lowercase UUID-shaped record id.
pub fn random_record_id() -> CastVoteRecordId {
    let bits: u128 = rand::thread_rng().gen();
    let hex = format!("{:032x}", bits);
    let id = format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    );
    CastVoteRecordId::new(id).expect("formatted id is 36 characters")
}

/// An export directory that deletes itself when dropped.
pub struct ExportFixture {
    dir: TempDir,
}

impl ExportFixture {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("creating export directory")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn record_dir(&self, cvr_id: &CastVoteRecordId) -> PathBuf {
        self.path().join(cvr_id.as_str())
    }

    /// Write a record directory holding the given files.
    pub fn write_record(
        &self,
        cvr_id: &CastVoteRecordId,
        files: &[(&str, &[u8])],
    ) -> anyhow::Result<()> {
        let dir = self.record_dir(cvr_id);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        for (name, contents) in files {
            let path = dir.join(name);
            std::fs::write(&path, contents)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }

    /// Write a record directory holding only its report.
    pub fn write_report(&self, cvr_id: &CastVoteRecordId, contents: &[u8]) -> anyhow::Result<()> {
        self.write_record(cvr_id, &[(REPORT_FILE_NAME, contents)])
    }

    pub fn remove_record(&self, cvr_id: &CastVoteRecordId) -> anyhow::Result<()> {
        let dir = self.record_dir(cvr_id);
        std::fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))
    }

    /// Write an export-level file next to the record directories.
    pub fn write_metadata(&self, contents: &str) -> anyhow::Result<()> {
        std::fs::write(self.path().join("metadata.json"), contents)?;
        Ok(())
    }
}

/// An export directory and the ledger that recorded it, kept in step.
pub struct ExportSession<S: HashStore = MemoryHashStore> {
    pub fixture: ExportFixture,
    pub ledger: IntegrityLedger<S>,
}

impl ExportSession<MemoryHashStore> {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_store(MemoryHashStore::new())
    }
}

impl<S: HashStore> ExportSession<S> {
    pub fn with_store(store: S) -> anyhow::Result<Self> {
        Ok(Self {
            fixture: ExportFixture::new()?,
            ledger: IntegrityLedger::new(store, IntegrityConfig::default()),
        })
    }

    /// Record a report in the ledger and write it to disk.
    pub fn export(
        &mut self,
        cvr_id: &CastVoteRecordId,
        contents: &[u8],
    ) -> anyhow::Result<Sha256Hash> {
        let report = FileFromData::new(REPORT_FILE_NAME, contents.to_vec());
        let files: [&dyn HashableFile; 1] = [&report];
        let leaf = self.ledger.record_exported(cvr_id, &files)?;
        self.fixture.write_report(cvr_id, contents)?;
        Ok(leaf)
    }

    pub fn path(&self) -> &Path {
        self.fixture.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_record_ids_are_valid_and_distinct() {
        let a = random_record_id();
        let b = random_record_id();
        assert_eq!(a.as_str().len(), 36);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixture_layout() {
        let fixture = ExportFixture::new().unwrap();
        let cvr_id = random_record_id();
        fixture
            .write_record(
                &cvr_id,
                &[(REPORT_FILE_NAME, &b"{}"[..]), ("front.jpg", &b"jpg"[..])],
            )
            .unwrap();

        assert!(fixture.record_dir(&cvr_id).join(REPORT_FILE_NAME).is_file());
        assert!(fixture.record_dir(&cvr_id).join("front.jpg").is_file());

        fixture.remove_record(&cvr_id).unwrap();
        assert!(!fixture.record_dir(&cvr_id).exists());
    }

    #[test]
    fn test_session_keeps_ledger_and_disk_in_step() {
        let mut session = ExportSession::new().unwrap();
        let cvr_id = random_record_id();
        session.export(&cvr_id, b"report").unwrap();

        assert_eq!(session.ledger.store().leaf_count().unwrap(), 1);
        assert!(session.fixture.record_dir(&cvr_id).is_dir());
    }
}
