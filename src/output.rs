//! Result types returned by a successful split and by `inspect`.

use crate::archive::ArchiveBlob;
use crate::config::OutputMode;
use serde::{Deserialize, Serialize};

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutput {
    /// The finalised archive, ready for download.
    #[serde(skip)]
    pub archive: ArchiveBlob,
    /// Name of the archive file (`{baseName}.zip`).
    pub archive_name: String,
    /// One entry per page in ascending page order.
    pub pages: Vec<PageSummary>,
    pub stats: SplitStats,
}

impl SplitOutput {
    /// The line shown to the user on success,
    /// e.g. "Successfully split into 3 individual PDF files."
    pub fn success_message(&self) -> String {
        success_message(self.stats.total_pages, self.stats.mode)
    }
}

/// Format the success line for `page_count` pages in `mode`.
pub fn success_message(page_count: usize, mode: OutputMode) -> String {
    labelled_success_message(page_count, mode.label())
}

/// Same as [`success_message`], for a format label already rendered as text.
pub fn labelled_success_message(page_count: usize, format_label: &str) -> String {
    format!(
        "Successfully split into {} individual {} files.",
        page_count, format_label
    )
}

/// One page artifact as it landed in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Entry name inside the archive, `{baseName}_p{page_num}.{ext}`.
    pub name: String,
    /// Size of the uncompressed artifact.
    pub bytes: usize,
}

/// Aggregate numbers for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitStats {
    pub total_pages: usize,
    pub mode: OutputMode,
    /// Size of the source PDF.
    pub input_bytes: usize,
    /// Size of the finished zip.
    pub archive_bytes: usize,
    pub load_duration_ms: u64,
    pub pages_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Metadata of a PDF, available without splitting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
    pub file_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_message_names_count_and_label() {
        assert_eq!(
            success_message(3, OutputMode::Pdf),
            "Successfully split into 3 individual PDF files."
        );
        assert_eq!(
            success_message(2, OutputMode::Jpg),
            "Successfully split into 2 individual JPG files."
        );
    }

    #[test]
    fn stats_serialise_mode_lowercase() {
        let stats = SplitStats {
            total_pages: 2,
            mode: OutputMode::Png,
            input_bytes: 10,
            archive_bytes: 20,
            load_duration_ms: 1,
            pages_duration_ms: 2,
            total_duration_ms: 3,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"mode\":\"png\""), "got: {json}");
    }
}
