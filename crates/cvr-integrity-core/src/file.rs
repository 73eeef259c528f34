//! Hashable and readable file adapters.
//!
//! An exported record is a directory of named files. The adapters here give
//! the leaf hash function a uniform view of a file whether its content is
//! still in memory (just rendered by the exporter) or already on disk (read
//! back by an auditor).

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::{Buf, Bytes};
use sha2::{Digest, Sha256};

use crate::crypto::Sha256Hash;
use crate::error::{CoreError, Result};

/// Read buffer size when streaming a file from disk.
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A named file whose content can be digested.
pub trait HashableFile {
    /// The file name as it appears inside the record directory.
    fn file_name(&self) -> &str;

    /// SHA-256 of the full file content.
    fn compute_sha256_hash(&self) -> Result<Sha256Hash>;
}

/// A hashable file that can also be opened as a fresh byte stream, any
/// number of times.
pub trait ReadableFile: HashableFile {
    fn open(&self) -> Result<Box<dyn Read + Send>>;
}

/// A file whose content is held in memory.
#[derive(Debug, Clone)]
pub struct FileFromData {
    file_name: String,
    contents: Bytes,
}

impl FileFromData {
    pub fn new(file_name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }
}

impl HashableFile for FileFromData {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn compute_sha256_hash(&self) -> Result<Sha256Hash> {
        Ok(Sha256Hash::hash(&self.contents))
    }
}

impl ReadableFile for FileFromData {
    fn open(&self) -> Result<Box<dyn Read + Send>> {
        // Cloning `Bytes` shares the buffer.
        Ok(Box::new(self.contents.clone().reader()))
    }
}

/// A file on disk, hashed by streaming rather than loading it whole.
#[derive(Debug, Clone)]
pub struct FileFromDisk {
    path: PathBuf,
    file_name: String,
}

impl FileFromDisk {
    /// Wrap a path, naming the file after its last path component.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| CoreError::InvalidFileName {
                name: path.display().to_string(),
                reason: "path has no UTF-8 file name component",
            })?;
        Ok(Self { path, file_name })
    }

    /// Wrap a path, exposing it under a different file name.
    pub fn with_file_name(path: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HashableFile for FileFromDisk {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn compute_sha256_hash(&self) -> Result<Sha256Hash> {
        let mut file = File::open(&self.path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; STREAM_CHUNK_SIZE];

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(Sha256Hash(hasher.finalize().into()))
    }
}

impl ReadableFile for FileFromDisk {
    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}
