//! Enumerating the records present in an export directory.
//!
//! An export directory holds one subdirectory per cast vote record, named by
//! its id, next to export-level files such as metadata and signatures.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use cvr_integrity_core::{CastVoteRecordId, CoreError};

use crate::error::{IntegrityError, Result};

/// Lists the record ids present in an export directory.
#[async_trait]
pub trait RecordIdLister: Send + Sync {
    async fn list_exported_record_ids(&self, export_dir: &Path)
        -> Result<BTreeSet<CastVoteRecordId>>;
}

/// Treats every subdirectory of the export directory as a record.
///
/// Plain files are skipped. A subdirectory whose name is not a valid record
/// id is an error rather than silently left out of the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubdirectoryLister;

#[async_trait]
impl RecordIdLister for SubdirectoryLister {
    async fn list_exported_record_ids(
        &self,
        export_dir: &Path,
    ) -> Result<BTreeSet<CastVoteRecordId>> {
        if !tokio::fs::metadata(export_dir).await?.is_dir() {
            return Err(IntegrityError::NotADirectory(export_dir.to_path_buf()));
        }

        let mut ids = BTreeSet::new();
        let mut entries = tokio::fs::read_dir(export_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().into_string().map_err(|name| {
                CoreError::InvalidRecordId {
                    id: name.to_string_lossy().into_owned(),
                    reason: "directory name is not valid UTF-8",
                }
            })?;
            ids.insert(CastVoteRecordId::new(name)?);
        }

        tracing::trace!(count = ids.len(), dir = %export_dir.display(), "listed exported records");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_A: &str = "a1234567-0000-0000-0000-000000000000";
    const ID_B: &str = "b1234567-0000-0000-0000-000000000000";

    #[tokio::test]
    async fn test_lists_subdirectories_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(ID_B)).unwrap();
        std::fs::create_dir(dir.path().join(ID_A)).unwrap();
        std::fs::write(dir.path().join("metadata.json"), "{}").unwrap();

        let ids = SubdirectoryLister
            .list_exported_record_ids(dir.path())
            .await
            .unwrap();
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec![ID_A, ID_B]);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ids = SubdirectoryLister
            .list_exported_record_ids(dir.path())
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_subdirectory_name_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("not-a-record")).unwrap();

        let result = SubdirectoryLister.list_exported_record_ids(dir.path()).await;
        assert!(matches!(
            result,
            Err(IntegrityError::Core(CoreError::InvalidRecordId { .. }))
        ));
    }

    #[tokio::test]
    async fn test_file_path_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("export.zip");
        std::fs::write(&file, "").unwrap();

        let result = SubdirectoryLister.list_exported_record_ids(&file).await;
        assert!(matches!(result, Err(IntegrityError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SubdirectoryLister
            .list_exported_record_ids(&dir.path().join("missing"))
            .await;
        assert!(matches!(result, Err(IntegrityError::Io(_))));
    }
}
