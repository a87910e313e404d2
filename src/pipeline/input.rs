//! Input handling: the user-supplied file and its validation.
//!
//! A [`SplitInput`] mirrors what an upload carries: a file name, the declared
//! content type (if any) and the raw bytes. Validation looks only at the name
//! and the declared type, never at the bytes, so a non-PDF is rejected before
//! any parse attempt is made.

use crate::error::SplitError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One file to split.
#[derive(Clone)]
pub struct SplitInput {
    /// File name as the user supplied it, e.g. `report.pdf`.
    pub name: String,
    /// Declared MIME type, e.g. `application/pdf`.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SplitInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitInput")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl SplitInput {
    /// Wrap in-memory bytes under a file name.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Attach a declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a local file. The file name becomes the input name; no content
    /// type is declared.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SplitError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => SplitError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => SplitError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read local file {} ({} bytes)", path.display(), bytes.len());

        Ok(Self::new(name, bytes))
    }

    /// Whether the input is acceptable as a PDF.
    pub fn is_pdf(&self) -> bool {
        is_pdf(&self.name, self.content_type.as_deref())
    }

    /// Validate the input and return its base name.
    ///
    /// # Errors
    /// [`SplitError::InvalidInputType`] when neither the declared type nor the
    /// name indicates a PDF.
    pub fn validate(&self) -> Result<String, SplitError> {
        if !self.is_pdf() {
            return Err(SplitError::InvalidInputType {
                name: self.name.clone(),
                content_type: self.content_type.clone(),
            });
        }
        Ok(base_name(&self.name))
    }
}

/// A file counts as PDF when its declared type mentions `pdf` or its name
/// ends in `.pdf` (case-insensitive).
pub fn is_pdf(name: &str, content_type: Option<&str>) -> bool {
    let typed = content_type.is_some_and(|t| t.contains("pdf"));
    typed || name.to_lowercase().ends_with(".pdf")
}

/// Strip one trailing `.pdf` (case-insensitive) from a file name.
pub fn base_name(name: &str) -> String {
    let len = name.len();
    if len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".pdf")
    {
        name[..len - 4].to_string()
    } else {
        name.to_string()
    }
}

/// Default output path for a split of `input`: `{baseName}.zip` next to it.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}.zip", base_name(&name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_by_name_or_type() {
        assert!(is_pdf("report.pdf", None));
        assert!(is_pdf("REPORT.PDF", None));
        assert!(is_pdf("scan", Some("application/pdf")));
        assert!(is_pdf("scan.bin", Some("application/x-pdf")));
        assert!(!is_pdf("notes.txt", Some("text/plain")));
        assert!(!is_pdf("notes.txt", None));
        assert!(!is_pdf("pdf", None));
    }

    #[test]
    fn test_base_name_strips_one_suffix() {
        assert_eq!(base_name("report.pdf"), "report");
        assert_eq!(base_name("Report.PDF"), "Report");
        assert_eq!(base_name("archive.pdf.pdf"), "archive.pdf");
        assert_eq!(base_name("scan"), "scan");
        assert_eq!(base_name("my.pdf.backup"), "my.pdf.backup");
        assert_eq!(base_name("résumé.pdf"), "résumé");
    }

    #[test]
    fn test_validate_returns_base_name() {
        let input = SplitInput::new("report.pdf", vec![]);
        assert_eq!(input.validate().unwrap(), "report");

        let typed = SplitInput::new("download", vec![]).with_content_type("application/pdf");
        assert_eq!(typed.validate().unwrap(), "download");
    }

    #[test]
    fn test_validate_rejects_non_pdf() {
        let input = SplitInput::new("photo.png", vec![1, 2, 3]).with_content_type("image/png");
        let err = input.validate().unwrap_err();
        assert!(matches!(err, SplitError::InvalidInputType { .. }));
        assert_eq!(err.user_message(), "Please select a PDF file.");
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/in/report.pdf")),
            PathBuf::from("/tmp/in/report.zip")
        );
        assert_eq!(
            default_output_path(Path::new("scan.PDF")),
            PathBuf::from("scan.zip")
        );
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let err = SplitInput::from_path("/definitely/not/a/real/file.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, SplitError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_from_path_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.7 stub").unwrap();

        let input = SplitInput::from_path(&path).await.unwrap();
        assert_eq!(input.name, "notes.pdf");
        assert!(input.content_type.is_none());
        assert_eq!(input.bytes, b"%PDF-1.7 stub");
    }
}
