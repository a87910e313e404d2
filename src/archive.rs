//! Archive builder: named page artifacts → one zip blob.
//!
//! [`ArchiveBuilder::finish`] consumes the builder, so a run can finalise its
//! archive exactly once and nothing can be appended to a finished archive.
//! The resulting [`ArchiveBlob`] is immutable and cheap to clone; a session
//! hands out clones for download while keeping its own copy.

use crate::config::OutputMode;
use crate::error::SplitError;
use std::fmt;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry name for page `page_num` (1-indexed): `{base}_p{page_num}.{ext}`.
pub fn artifact_name(base_name: &str, page_num: usize, mode: OutputMode) -> String {
    format!("{}_p{}.{}", base_name, page_num, mode.extension())
}

/// Archive file name for a base name: `{base}.zip`.
pub fn archive_name(base_name: &str) -> String {
    format!("{base_name}.zip")
}

/// One page's output, named and ready to be archived.
#[derive(Debug, Clone)]
pub struct PageArtifact {
    /// 1-indexed page number.
    pub page_num: usize,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PageArtifact {
    pub fn new(base_name: &str, page_num: usize, mode: OutputMode, bytes: Vec<u8>) -> Self {
        Self {
            page_num,
            name: artifact_name(base_name, page_num, mode),
            bytes,
        }
    }
}

/// Accumulates named entries into an in-memory zip.
pub struct ArchiveBuilder {
    name: String,
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
}

impl ArchiveBuilder {
    /// Start an empty archive that will be named `{base_name}.zip`.
    pub fn new(base_name: &str) -> Self {
        Self {
            name: archive_name(base_name),
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    /// Append one entry.
    ///
    /// Names are expected to be unique within a run; the orchestrator
    /// guarantees this by numbering pages.
    pub fn add(&mut self, name: impl Into<String>, bytes: &[u8]) -> Result<(), SplitError> {
        let name = name.into();
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        self.writer
            .start_file(name.clone(), options)
            .map_err(|e| SplitError::ArchiveFailed(format!("entry '{name}': {e}")))?;
        self.writer
            .write_all(bytes)
            .map_err(|e| SplitError::ArchiveFailed(format!("writing '{name}': {e}")))?;

        debug!("Archived {} ({} bytes)", name, bytes.len());
        self.entries.push(name);
        Ok(())
    }

    /// Append a page artifact under its own name.
    pub fn add_artifact(&mut self, artifact: &PageArtifact) -> Result<(), SplitError> {
        self.add(artifact.name.clone(), &artifact.bytes)
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the central directory and return the finished archive.
    pub fn finish(mut self) -> Result<ArchiveBlob, SplitError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| SplitError::ArchiveFailed(format!("finalise: {e}")))?;
        let bytes = cursor.into_inner();
        debug!(
            "Finalised {} with {} entries, {} bytes",
            self.name,
            self.entries.len(),
            bytes.len()
        );

        Ok(ArchiveBlob {
            name: self.name,
            bytes: bytes.into(),
            entries: self.entries.into(),
        })
    }
}

/// A finalised, immutable zip archive.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveBlob {
    name: String,
    bytes: Arc<[u8]>,
    entries: Arc<[String]>,
}

impl ArchiveBlob {
    /// File name for download, `{baseName}.zip`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encoded zip.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Entry names in the order they were added.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Size of the encoded zip.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ArchiveBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveBlob")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("entries", &self.entries)
            .finish()
    }
}
