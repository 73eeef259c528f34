//! Recomputing the root hash of an export directory from its files alone.
//!
//! The verifier reads the filesystem and nothing else: it never touches a
//! hash store. Run against an export that mirrors what was fed to the store,
//! it must reproduce the store's root exactly.

use std::path::Path;

use cvr_integrity_core::{
    compute_cast_vote_record_directory_hash, CastVoteRecordId, CoreError, FileFromData,
    FileFromDisk, HashTree, HashableFile, Sha256Hash,
};

use crate::config::{IntegrityConfig, ReadMode};
use crate::error::{IntegrityError, Result};
use crate::listing::{RecordIdLister, SubdirectoryLister};

/// Computes the hash tree of an export directory in one pass.
#[derive(Debug, Clone)]
pub struct FromScratchVerifier<L = SubdirectoryLister> {
    lister: L,
    config: IntegrityConfig,
}

impl Default for FromScratchVerifier<SubdirectoryLister> {
    fn default() -> Self {
        Self::new(SubdirectoryLister, IntegrityConfig::default())
    }
}

impl<L: RecordIdLister> FromScratchVerifier<L> {
    pub fn new(lister: L, config: IntegrityConfig) -> Self {
        Self { lister, config }
    }

    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    /// Hash every listed record's report and aggregate the full tree.
    pub async fn compute_tree(&self, export_dir: &Path) -> Result<HashTree> {
        let ids = self.lister.list_exported_record_ids(export_dir).await?;

        let mut leaves = Vec::with_capacity(ids.len());
        for cvr_id in ids {
            let leaf = self.compute_leaf_hash(export_dir, &cvr_id).await?;
            leaves.push((cvr_id, leaf));
        }

        let tree = HashTree::from_leaves(leaves);
        tracing::debug!(
            records = tree.leaf_count(),
            dir = %export_dir.display(),
            "recomputed export hash tree"
        );
        Ok(tree)
    }

    /// Root digest as lowercase hex, `""` for an export with no records.
    pub async fn compute_root_hash(&self, export_dir: &Path) -> Result<String> {
        let tree = self.compute_tree(export_dir).await?;
        Ok(tree.root().map(|h| h.to_hex()).unwrap_or_default())
    }

    /// Leaf digest of one record, covering every regular file in
    /// `<export_dir>/<id>/`. The report file must be one of them.
    pub async fn compute_leaf_hash(
        &self,
        export_dir: &Path,
        cvr_id: &CastVoteRecordId,
    ) -> Result<Sha256Hash> {
        let record_dir = export_dir.join(cvr_id.as_str());
        let file_names = self.record_file_names(&record_dir).await?;

        let leaf = match self.config.read_mode {
            ReadMode::Buffered => {
                let mut files = Vec::with_capacity(file_names.len());
                for name in file_names {
                    let contents = tokio::fs::read(record_dir.join(&name)).await?;
                    files.push(FileFromData::new(name, contents));
                }
                directory_hash(cvr_id, &files)?
            }
            ReadMode::Streaming => {
                let cvr_id = cvr_id.clone();
                tokio::task::spawn_blocking(move || {
                    let files: Vec<FileFromDisk> = file_names
                        .into_iter()
                        .map(|name| FileFromDisk::with_file_name(record_dir.join(&name), name))
                        .collect();
                    directory_hash(&cvr_id, &files)
                })
                .await??
            }
        };

        tracing::trace!(cvr_id = %cvr_id, leaf = %leaf, "hashed exported record");
        Ok(leaf)
    }

    /// Names of the regular files in a record directory, sorted.
    async fn record_file_names(&self, record_dir: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(record_dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().into_string().map_err(|name| {
                CoreError::InvalidFileName {
                    name: name.to_string_lossy().into_owned(),
                    reason: "is not valid UTF-8",
                }
            })?;
            names.push(name);
        }

        if !names.contains(&self.config.report_file_name) {
            return Err(IntegrityError::MissingReport(
                record_dir.join(&self.config.report_file_name),
            ));
        }
        names.sort();
        Ok(names)
    }
}

fn directory_hash<F: HashableFile>(
    cvr_id: &CastVoteRecordId,
    files: &[F],
) -> std::result::Result<Sha256Hash, CoreError> {
    let files: Vec<&dyn HashableFile> = files.iter().map(|f| f as &dyn HashableFile).collect();
    compute_cast_vote_record_directory_hash(cvr_id, &files)
}

/// Recompute the root of an export directory with the default lister and
/// configuration. Returns `""` when the export holds no records.
pub async fn compute_cast_vote_record_root_hash_from_scratch(
    export_dir: impl AsRef<Path>,
) -> Result<String> {
    FromScratchVerifier::default()
        .compute_root_hash(export_dir.as_ref())
        .await
}
