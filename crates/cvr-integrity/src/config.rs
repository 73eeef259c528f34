//! Configuration for reading an export back from disk.

use serde::{Deserialize, Serialize};

/// File name of the per-record report written by the exporter.
pub const DEFAULT_REPORT_FILE_NAME: &str = "cast-vote-record-report.json";

/// How the verifier reads report files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Read each record file fully into memory, then hash it.
    #[default]
    Buffered,
    /// Hash each record file in fixed-size chunks on a blocking task.
    Streaming,
}

/// Integrity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Report file looked up under every record directory.
    pub report_file_name: String,
    /// Report read strategy. Both modes yield identical digests.
    pub read_mode: ReadMode,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            report_file_name: DEFAULT_REPORT_FILE_NAME.to_owned(),
            read_mode: ReadMode::Buffered,
        }
    }
}
