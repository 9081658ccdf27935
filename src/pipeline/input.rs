//! Input handling: the uploaded-file value and request-level validation.
//!
//! Everything here runs before any byte is decoded. Request-level
//! rejections are no files, no named files, an upload over the size guard,
//! or no file with an allowed extension. A single file with a disallowed
//! extension is only turned away on its own.

use crate::config::{FileKind, StudyConfig};
use crate::error::{FileError, StudyError};
use std::path::Path;
use tracing::{debug, warn};

/// One file as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name as uploaded (already sanitised by the caller).
    pub name: String,
    /// Declared extension, lower-case, without the dot. Empty if none.
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Build an upload, deriving the declared extension from `name`.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let extension = declared_extension(&name);
        Self {
            name,
            extension,
            bytes: bytes.into(),
        }
    }

    /// Read a local file into an upload named after its final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::Unreadable {
                detail: format!("{}: {e}", path.display()),
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::new(name, bytes))
    }
}

/// Extension after the last `.`, lower-cased. `"notes.TXT"` → `"txt"`.
pub fn declared_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// The boundary's verdict on one named upload, in upload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Allowed extension; extract with this kind.
    Accepted(UploadedFile, FileKind),
    /// Disallowed extension; never extracted.
    Rejected { name: String, extension: String },
}

/// Validate an upload batch and decide, per named file, whether it is
/// extracted.
///
/// Unnamed entries next to named ones are skipped (browsers send an empty
/// part when the picker is left blank). Files with a disallowed extension
/// stay in the list as [`Admission::Rejected`] so they are reported next to
/// the others; the request fails only when no file is accepted.
pub fn validate_uploads(
    files: Vec<UploadedFile>,
    config: &StudyConfig,
) -> Result<Vec<Admission>, StudyError> {
    if files.is_empty() {
        return Err(StudyError::NoFilesProvided);
    }

    let size: usize = files.iter().map(|f| f.bytes.len()).sum();
    let total = files.len();
    let named: Vec<UploadedFile> = files
        .into_iter()
        .filter(|f| !f.name.trim().is_empty())
        .collect();
    if named.is_empty() {
        return Err(StudyError::NoFilesSelected);
    }
    if named.len() < total {
        warn!("Skipping {} unnamed upload(s)", total - named.len());
    }

    if size > config.max_upload_bytes {
        return Err(StudyError::PayloadTooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    let admissions: Vec<Admission> = named
        .into_iter()
        .map(|f| match config.file_kind(&f.extension) {
            Some(kind) => Admission::Accepted(f, kind),
            None => {
                warn!("{}: unsupported file type '.{}', skipping", f.name, f.extension);
                Admission::Rejected {
                    name: f.name,
                    extension: f.extension,
                }
            }
        })
        .collect();

    if admissions.iter().any(|a| matches!(a, Admission::Accepted(..))) {
        return Ok(admissions);
    }
    match admissions.into_iter().next() {
        Some(Admission::Rejected { name, extension }) => Err(StudyError::UnsupportedFileType {
            name,
            extension,
            allowed: config.allowed_list(),
        }),
        _ => Err(StudyError::NoFilesSelected),
    }
}
