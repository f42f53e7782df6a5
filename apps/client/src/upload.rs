//! Client-side validation of resume files before submission.
//!
//! The transport client assumes its input already passed these checks,
//! mirroring how the upload form gated the file picker: PDF, DOC, or
//! DOCX only, at most 5 MB.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

/// Maximum accepted upload size: 5 MB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("unsupported file type '{0}' (accepted: PDF, DOC, DOCX)")]
    UnsupportedType(String),

    #[error("file is {size} bytes, over the {MAX_UPLOAD_BYTES} byte limit")]
    TooLarge { size: u64 },

    #[error("file is empty")]
    Empty,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Accepted resume formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Doc,
    Docx,
}

impl FileKind {
    /// Extension match, ASCII case-insensitive. `None` for anything
    /// outside the accepted set.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "doc" => Some(FileKind::Doc),
            "docx" => Some(FileKind::Docx),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Doc => "application/msword",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A resume validated and loaded into memory, ready to submit.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub kind: FileKind,
    pub bytes: Bytes,
}

impl ResumeFile {
    /// Reads and validates a resume from disk.
    pub fn from_path(path: &Path) -> Result<Self, FileError> {
        let kind = FileKind::from_path(path)
            .ok_or_else(|| FileError::UnsupportedType(path.display().to_string()))?;

        let contents = std::fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());

        Self::validated(file_name, kind, Bytes::from(contents))
    }

    /// Validates an in-memory payload, e.g. one received from another
    /// layer that already read the file.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Bytes) -> Result<Self, FileError> {
        let file_name = file_name.into();
        let kind = FileKind::from_path(Path::new(&file_name))
            .ok_or_else(|| FileError::UnsupportedType(file_name.clone()))?;
        Self::validated(file_name, kind, bytes)
    }

    fn validated(file_name: String, kind: FileKind, bytes: Bytes) -> Result<Self, FileError> {
        if bytes.is_empty() {
            return Err(FileError::Empty);
        }
        let size = bytes.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(FileError::TooLarge { size });
        }
        Ok(ResumeFile {
            file_name,
            kind,
            bytes,
        })
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}
